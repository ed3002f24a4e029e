//! Cleanup journal.
//!
//! Every narrative line is stamped once and written to both the append-only
//! log file and the console [`Reporter`]. The file is the audit trail; it is
//! created fresh per run and never read back.

use crate::config;
use crate::error::ReclaimError;
use crate::reporter::{Level, LogEntry, Reporter};
use crate::snapshot::DiskSnapshot;
use crate::summary::Summary;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Suffixed names tried before giving up on a per-second log name.
const MAX_LOG_ATTEMPTS: u32 = 100;

/// Current local time in journal format.
pub fn stamp() -> String {
    chrono::Local::now().format(STAMP_FORMAT).to_string()
}

/// Append-only log file.
#[derive(Debug)]
pub struct CleanupLog {
    path: PathBuf,
    file: File,
}

impl CleanupLog {
    /// Create a new log at `path`. An existing file is never reused.
    ///
    /// # Errors
    ///
    /// Returns [`ReclaimError::LogCreate`] if the file exists or cannot be
    /// created.
    pub fn create(path: &Path) -> Result<Self, ReclaimError> {
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(path)
            .map_err(|source| ReclaimError::LogCreate {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Create the log for a run started at `started_unix` in `dir`.
    ///
    /// Moves on to a suffixed name while the plain one is taken.
    ///
    /// # Errors
    ///
    /// Returns [`ReclaimError::LogCreate`] if no fresh file can be created.
    pub fn for_run(dir: &Path, started_unix: i64) -> Result<Self, ReclaimError> {
        let mut attempt = 0;
        loop {
            match Self::create(&config::log_path(dir, started_unix, attempt)) {
                Err(ReclaimError::LogCreate { source, .. })
                    if source.kind() == ErrorKind::AlreadyExists
                        && attempt + 1 < MAX_LOG_ATTEMPTS =>
                {
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line.
    ///
    /// # Errors
    ///
    /// Returns [`ReclaimError::LogWrite`] if the write fails.
    pub fn append(&mut self, line: &str) -> Result<(), ReclaimError> {
        writeln!(self.file, "{line}").map_err(|source| ReclaimError::LogWrite {
            path: self.path.clone(),
            source,
        })
    }
}

/// Fans journal lines out to the log file and the console.
pub struct Journal<'a> {
    log: CleanupLog,
    reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for Journal<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("log", &self.log.path)
            .finish_non_exhaustive()
    }
}

impl<'a> Journal<'a> {
    /// Wrap an open log and a console reporter.
    pub fn new(log: CleanupLog, reporter: &'a dyn Reporter) -> Self {
        reporter.log_opened(log.path());
        Self { log, reporter }
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        self.log.path()
    }

    /// Record one line at `level`.
    ///
    /// # Errors
    ///
    /// Returns [`ReclaimError::LogWrite`] if the file write fails.
    pub fn record(&mut self, level: Level, message: impl Into<String>) -> Result<(), ReclaimError> {
        let entry = LogEntry {
            stamp: stamp(),
            level,
            message: message.into(),
        };
        self.log.append(&entry.to_string())?;
        self.reporter.log(&entry);
        Ok(())
    }

    /// Record an informational line.
    ///
    /// # Errors
    ///
    /// Returns [`ReclaimError::LogWrite`] if the file write fails.
    pub fn info(&mut self, message: impl Into<String>) -> Result<(), ReclaimError> {
        self.record(Level::Info, message)
    }

    /// Record a success line.
    ///
    /// # Errors
    ///
    /// Returns [`ReclaimError::LogWrite`] if the file write fails.
    pub fn success(&mut self, message: impl Into<String>) -> Result<(), ReclaimError> {
        self.record(Level::Success, message)
    }

    /// Record a warning line.
    ///
    /// # Errors
    ///
    /// Returns [`ReclaimError::LogWrite`] if the file write fails.
    pub fn warning(&mut self, message: impl Into<String>) -> Result<(), ReclaimError> {
        self.record(Level::Warning, message)
    }

    /// Start a new stage: console banner plus a marker line in the file.
    ///
    /// # Errors
    ///
    /// Returns [`ReclaimError::LogWrite`] if the file write fails.
    pub fn section(&mut self, title: &str) -> Result<(), ReclaimError> {
        self.reporter.section(title);
        self.log.append(&format!("[{}] === {title} ===", stamp()))
    }

    /// Record a disk-usage snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ReclaimError::LogWrite`] if the file write fails.
    pub fn snapshot(&mut self, label: &str, snapshot: &DiskSnapshot) -> Result<(), ReclaimError> {
        if snapshot.usage.is_none() {
            self.warning("Unable to retrieve container engine disk usage")?;
        }
        if snapshot.filesystem.is_none() {
            self.warning("Unable to retrieve host filesystem usage")?;
        }

        self.reporter.snapshot(label, snapshot);
        let at = stamp();
        for line in snapshot.lines() {
            self.log.append(&format!("[{at}] {line}"))?;
        }
        Ok(())
    }

    /// Record the final summary.
    ///
    /// # Errors
    ///
    /// Returns [`ReclaimError::LogWrite`] if the file write fails.
    pub fn summary(&mut self, summary: &Summary) -> Result<(), ReclaimError> {
        self.reporter.summary(summary);
        let at = stamp();
        for line in summary.lines() {
            self.log.append(&format!("[{at}] {line}"))?;
        }
        Ok(())
    }

    /// Best-effort final line before a fatal exit. Write errors are ignored.
    pub fn abort(&mut self, during: &str, error: &ReclaimError) {
        let entry = LogEntry {
            stamp: stamp(),
            level: Level::Error,
            message: format!("Cleanup aborted during {during}: {error}"),
        };
        let _ = self.log.append(&entry.to_string());
        self.reporter.log(&entry);
    }
}
