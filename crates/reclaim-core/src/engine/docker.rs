//! `docker` CLI driver.
//!
//! Every listing asks for `--format '{{json .}}'`, which prints one JSON
//! object per line, and decodes the lines with `serde_json`.

use super::{
    ContainerRecord, DiskUsageRow, Engine, FilesystemUsage, ImageRecord, NetworkRecord,
    PREDEFINED_NETWORKS, PruneReport, VolumeRecord,
};
use crate::error::EngineError;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::process::Command;

const JSON_FORMAT: &str = "{{json .}}";

/// [`Engine`] backed by the `docker` command line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: PathBuf,
}

impl DockerCli {
    /// Use `program` as-is, without checking that it exists.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve the engine binary, either `explicit` or `docker` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if no executable can be found.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, EngineError> {
        let wanted = explicit.unwrap_or_else(|| Path::new("docker"));
        let program = which::which(wanted).map_err(|_| EngineError::NotFound {
            program: wanted.display().to_string(),
        })?;
        tracing::debug!("Using container engine at {}", program.display());
        Ok(Self { program })
    }

    /// Path of the engine binary.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn docker(&self, args: &[&str]) -> Result<String, EngineError> {
        exec(&self.program, args)
    }

    fn json_lines<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Vec<T>, EngineError> {
        let stdout = self.docker(args)?;
        parse_json_lines(&stdout).map_err(|message| EngineError::Parse {
            command: render(&self.program, args),
            message,
        })
    }

    fn images(&self, args: &[&str]) -> Result<Vec<ImageRecord>, EngineError> {
        let lines: Vec<ImageLine> = self.json_lines(args)?;
        lines
            .into_iter()
            .map(|line| {
                let created_at =
                    parse_created_at(&line.created_at).map_err(|message| EngineError::Parse {
                        command: render(&self.program, args),
                        message,
                    })?;
                Ok(ImageRecord {
                    repository: line.repository,
                    tag: line.tag,
                    id: line.id,
                    created_at,
                    size: line.size,
                })
            })
            .collect()
    }

    fn root_dir(&self) -> PathBuf {
        self.docker(&["info", "--format", "{{.DockerRootDir}}"])
            .ok()
            .map(|out| PathBuf::from(out.trim()))
            .filter(|dir| !dir.as_os_str().is_empty() && dir.exists())
            .unwrap_or_else(|| PathBuf::from("/"))
    }
}

impl Engine for DockerCli {
    fn stopped_containers(&self) -> Result<Vec<ContainerRecord>, EngineError> {
        let lines: Vec<ContainerLine> = self.json_lines(&[
            "ps",
            "-a",
            "--filter",
            "status=exited",
            "--format",
            JSON_FORMAT,
        ])?;
        Ok(lines
            .into_iter()
            .map(|line| ContainerRecord {
                id: line.id,
                name: line.names,
                image: line.image,
                status: line.status,
            })
            .collect())
    }

    fn remove_container(&self, id: &str) -> Result<(), EngineError> {
        self.docker(&["rm", id]).map(drop)
    }

    fn repository_images(&self, repository: &str) -> Result<Vec<ImageRecord>, EngineError> {
        self.images(&["images", repository, "--format", JSON_FORMAT])
    }

    fn remove_image(&self, id: &str) -> Result<(), EngineError> {
        self.docker(&["rmi", id]).map(drop)
    }

    fn dangling_images(&self) -> Result<Vec<ImageRecord>, EngineError> {
        self.images(&[
            "images",
            "--filter",
            "dangling=true",
            "--format",
            JSON_FORMAT,
        ])
    }

    fn unused_networks(&self) -> Result<Vec<NetworkRecord>, EngineError> {
        let lines: Vec<NetworkLine> = self.json_lines(&[
            "network",
            "ls",
            "--filter",
            "dangling=true",
            "--format",
            JSON_FORMAT,
        ])?;
        Ok(lines
            .into_iter()
            .filter(|line| !PREDEFINED_NETWORKS.contains(&line.name.as_str()))
            .map(|line| NetworkRecord {
                id: line.id,
                name: line.name,
                driver: line.driver,
            })
            .collect())
    }

    fn remove_network(&self, id: &str) -> Result<(), EngineError> {
        self.docker(&["network", "rm", id]).map(drop)
    }

    fn unused_volumes(&self) -> Result<Vec<VolumeRecord>, EngineError> {
        let lines: Vec<VolumeLine> = self.json_lines(&[
            "volume",
            "ls",
            "--filter",
            "dangling=true",
            "--format",
            JSON_FORMAT,
        ])?;
        Ok(lines
            .into_iter()
            .map(|line| VolumeRecord {
                name: line.name,
                driver: line.driver,
            })
            .collect())
    }

    fn remove_volume(&self, name: &str) -> Result<(), EngineError> {
        self.docker(&["volume", "rm", name]).map(drop)
    }

    fn prune_build_cache(&self) -> Result<PruneReport, EngineError> {
        let stdout = self.docker(&["builder", "prune", "-f"])?;
        Ok(PruneReport {
            reclaimed: parse_reclaimed(&stdout),
        })
    }

    fn prune_system(&self) -> Result<PruneReport, EngineError> {
        let stdout = self.docker(&["system", "prune", "-f"])?;
        Ok(PruneReport {
            reclaimed: parse_reclaimed(&stdout),
        })
    }

    fn disk_usage(&self) -> Result<Vec<DiskUsageRow>, EngineError> {
        let lines: Vec<DiskUsageLine> =
            self.json_lines(&["system", "df", "--format", JSON_FORMAT])?;
        Ok(lines
            .into_iter()
            .map(|line| DiskUsageRow {
                kind: line.kind,
                total_count: line.total_count.value(),
                active: line.active.value(),
                size: line.size,
                reclaimable: line.reclaimable,
            })
            .collect())
    }

    fn filesystem_usage(&self) -> Result<FilesystemUsage, EngineError> {
        let root = self.root_dir();
        let root = root.to_string_lossy();
        let df = Path::new("df");
        let stdout = exec(df, &["-Pk", &root])?;
        parse_df(&stdout).map_err(|message| EngineError::Parse {
            command: render(df, &["-Pk", &root]),
            message,
        })
    }
}

/// Run `program args...` and return its stdout.
fn exec(program: &Path, args: &[&str]) -> Result<String, EngineError> {
    let command = render(program, args);
    tracing::debug!("Running {command}");

    let output = match Command::new(program).args(args).output() {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(EngineError::NotFound {
                program: program.display().to_string(),
            });
        }
        Err(source) => {
            return Err(EngineError::Spawn {
                program: program.display().to_string(),
                source,
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr
        };
        return Err(EngineError::Command { command, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn render(program: &Path, args: &[&str]) -> String {
    let name = program
        .file_name()
        .map_or_else(|| program.display().to_string(), |n| n.to_string_lossy().into_owned());
    if args.is_empty() {
        name
    } else {
        format!("{name} {}", args.join(" "))
    }
}

#[derive(Debug, Deserialize)]
struct ContainerLine {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Names", default)]
    names: String,
    #[serde(rename = "Image", default)]
    image: String,
    #[serde(rename = "Status", default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct ImageLine {
    #[serde(rename = "Repository")]
    repository: String,
    #[serde(rename = "Tag")]
    tag: String,
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "CreatedAt")]
    created_at: String,
    #[serde(rename = "Size", default)]
    size: String,
}

#[derive(Debug, Deserialize)]
struct NetworkLine {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Driver", default)]
    driver: String,
}

#[derive(Debug, Deserialize)]
struct VolumeLine {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Driver", default)]
    driver: String,
}

#[derive(Debug, Deserialize)]
struct DiskUsageLine {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "TotalCount", default)]
    total_count: Count,
    #[serde(rename = "Active", default)]
    active: Count,
    #[serde(rename = "Size", default)]
    size: String,
    #[serde(rename = "Reclaimable", default)]
    reclaimable: String,
}

/// `docker system df` prints counts as strings on some versions and numbers on others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Count {
    Number(u64),
    Text(String),
}

impl Default for Count {
    fn default() -> Self {
        Self::Number(0)
    }
}

impl Count {
    fn value(&self) -> u64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

/// Decode one JSON object per non-blank line.
fn parse_json_lines<T: DeserializeOwned>(stdout: &str) -> Result<Vec<T>, String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).map_err(|e| format!("{e} in line {line:?}")))
        .collect()
}

/// Parse the engine's `CreatedAt` column, e.g. `2024-01-15 10:23:45 +0000 UTC`.
fn parse_created_at(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts);
    }

    // Drop the trailing zone abbreviation; the numeric offset carries the meaning.
    let stamp = raw.split_whitespace().take(3).collect::<Vec<_>>().join(" ");
    DateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S %z")
        .map_err(|e| format!("bad creation time {raw:?}: {e}"))
}

/// Pull the reclaimed-space figure out of prune output.
fn parse_reclaimed(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("Total reclaimed space:")
                .or_else(|| line.strip_prefix("Total:"))
                .map(|rest| rest.trim().to_string())
        })
        .filter(|amount| !amount.is_empty())
        .next_back()
}

/// Parse POSIX `df -Pk` output for a single path.
fn parse_df(stdout: &str) -> Result<FilesystemUsage, String> {
    let line = stdout
        .lines()
        .skip(1)
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| "no filesystem line".to_string())?;

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 {
        return Err(format!("short filesystem line {line:?}"));
    }

    let number = |field: &str| {
        field
            .parse::<u64>()
            .map_err(|e| format!("bad size {field:?}: {e}"))
    };

    Ok(FilesystemUsage {
        filesystem: fields[0].to_string(),
        size_kb: number(fields[1])?,
        used_kb: number(fields[2])?,
        available_kb: number(fields[3])?,
        capacity: fields[4].to_string(),
        mount: fields[5..].join(" "),
    })
}
