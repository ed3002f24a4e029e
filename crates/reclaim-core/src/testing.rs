//! In-memory engine and reporter used by the unit tests.

use crate::engine::{
    BUILD_CACHE_KIND, ContainerRecord, DiskUsageRow, Engine, FilesystemUsage, ImageRecord,
    NetworkRecord, PruneReport, VolumeRecord,
};
use crate::error::EngineError;
use crate::journal::{CleanupLog, Journal};
use crate::reporter::{Level, LogEntry, Reporter};
use crate::snapshot::DiskSnapshot;
use crate::summary::Summary;
use chrono::DateTime;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scripted inventory plus a record of every mutating call.
#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    containers: Vec<ContainerRecord>,
    images: Vec<ImageRecord>,
    dangling: Vec<ImageRecord>,
    networks: Vec<NetworkRecord>,
    volumes: Vec<VolumeRecord>,
    usage: Vec<DiskUsageRow>,
    failing: HashSet<String>,
    queries_fail: bool,
    calls: RefCell<Vec<String>>,
}

pub(crate) fn image(repository: &str, tag: &str, id: &str, created: &str) -> ImageRecord {
    ImageRecord {
        repository: repository.into(),
        tag: tag.into(),
        id: id.into(),
        created_at: DateTime::parse_from_rfc3339(created).unwrap(),
        size: "100MB".into(),
    }
}

impl FakeEngine {
    pub(crate) fn with_stopped(mut self, count: usize) -> Self {
        self.containers = (0..count)
            .map(|i| ContainerRecord {
                id: format!("container-{i}"),
                name: format!("app-{i}"),
                image: "nginx:latest".into(),
                status: "Exited (0) 1 hour ago".into(),
            })
            .collect();
        self
    }

    pub(crate) fn with_images(mut self, images: Vec<ImageRecord>) -> Self {
        self.images = images;
        self
    }

    pub(crate) fn with_dangling(mut self, count: usize) -> Self {
        self.dangling = (0..count)
            .map(|i| {
                image(
                    "<none>",
                    "<none>",
                    &format!("dangling-{i}"),
                    "2024-01-01T00:00:00Z",
                )
            })
            .collect();
        self
    }

    pub(crate) fn with_networks(mut self, count: usize) -> Self {
        self.networks = (0..count)
            .map(|i| NetworkRecord {
                id: format!("network-{i}"),
                name: format!("net-{i}"),
                driver: "bridge".into(),
            })
            .collect();
        self
    }

    pub(crate) fn with_volumes(mut self, count: usize) -> Self {
        self.volumes = (0..count)
            .map(|i| VolumeRecord {
                name: format!("volume-{i}"),
                driver: "local".into(),
            })
            .collect();
        self
    }

    pub(crate) fn with_build_cache(mut self, entries: u64) -> Self {
        self.usage.push(DiskUsageRow {
            kind: BUILD_CACHE_KIND.into(),
            total_count: entries,
            active: 0,
            size: "300MB".into(),
            reclaimable: if entries == 0 { "0B" } else { "300MB" }.into(),
        });
        self
    }

    pub(crate) fn with_reclaimable_images(mut self) -> Self {
        self.usage.push(DiskUsageRow {
            kind: "Images".into(),
            total_count: 4,
            active: 1,
            size: "2GB".into(),
            reclaimable: "1.5GB (75%)".into(),
        });
        self
    }

    pub(crate) fn failing_removal(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub(crate) fn failing_queries(mut self) -> Self {
        self.queries_fail = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn query<T: Clone>(&self, items: &[T]) -> Result<Vec<T>, EngineError> {
        if self.queries_fail {
            return Err(EngineError::Command {
                command: "docker".into(),
                stderr: "Cannot connect to the Docker daemon".into(),
            });
        }
        Ok(items.to_vec())
    }

    fn mutate(&self, call: String, id: &str) -> Result<(), EngineError> {
        let failed = self.failing.contains(id);
        self.calls.borrow_mut().push(call.clone());
        if failed {
            return Err(EngineError::Command {
                command: call,
                stderr: "resource is in use".into(),
            });
        }
        Ok(())
    }
}

impl Engine for FakeEngine {
    fn stopped_containers(&self) -> Result<Vec<ContainerRecord>, EngineError> {
        self.query(&self.containers)
    }

    fn remove_container(&self, id: &str) -> Result<(), EngineError> {
        self.mutate(format!("rm {id}"), id)
    }

    fn repository_images(&self, repository: &str) -> Result<Vec<ImageRecord>, EngineError> {
        Ok(self
            .query(&self.images)?
            .into_iter()
            .filter(|i| i.repository == repository)
            .collect())
    }

    fn remove_image(&self, id: &str) -> Result<(), EngineError> {
        self.mutate(format!("rmi {id}"), id)
    }

    fn dangling_images(&self) -> Result<Vec<ImageRecord>, EngineError> {
        self.query(&self.dangling)
    }

    fn unused_networks(&self) -> Result<Vec<NetworkRecord>, EngineError> {
        self.query(&self.networks)
    }

    fn remove_network(&self, id: &str) -> Result<(), EngineError> {
        self.mutate(format!("network rm {id}"), id)
    }

    fn unused_volumes(&self) -> Result<Vec<VolumeRecord>, EngineError> {
        self.query(&self.volumes)
    }

    fn remove_volume(&self, name: &str) -> Result<(), EngineError> {
        self.mutate(format!("volume rm {name}"), name)
    }

    fn prune_build_cache(&self) -> Result<PruneReport, EngineError> {
        self.mutate("builder prune".into(), "builder")?;
        Ok(PruneReport {
            reclaimed: Some("300MB".into()),
        })
    }

    fn prune_system(&self) -> Result<PruneReport, EngineError> {
        self.mutate("system prune".into(), "system")?;
        Ok(PruneReport::default())
    }

    fn disk_usage(&self) -> Result<Vec<DiskUsageRow>, EngineError> {
        self.query(&self.usage)
    }

    fn filesystem_usage(&self) -> Result<FilesystemUsage, EngineError> {
        self.query(&[()])?;
        Ok(FilesystemUsage {
            filesystem: "/dev/sda1".into(),
            mount: "/".into(),
            size_kb: 100 * 1024 * 1024,
            used_kb: 40 * 1024 * 1024,
            available_kb: 60 * 1024 * 1024,
            capacity: "40%".into(),
        })
    }
}

/// Captures everything the journal sends to the console.
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    entries: RefCell<Vec<LogEntry>>,
    sections: RefCell<Vec<String>>,
    summaries: RefCell<Vec<Summary>>,
    opened: RefCell<Vec<PathBuf>>,
}

impl RecordingReporter {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    pub(crate) fn warnings(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.level == Level::Warning)
            .map(|e| e.message.clone())
            .collect()
    }

    pub(crate) fn sections(&self) -> Vec<String> {
        self.sections.borrow().clone()
    }

    pub(crate) fn summaries(&self) -> Vec<Summary> {
        self.summaries.borrow().clone()
    }

    pub(crate) fn opened(&self) -> Vec<PathBuf> {
        self.opened.borrow().clone()
    }
}

impl Reporter for RecordingReporter {
    fn log_opened(&self, path: &Path) {
        self.opened.borrow_mut().push(path.to_path_buf());
    }

    fn section(&self, title: &str) {
        self.sections.borrow_mut().push(title.to_string());
    }

    fn log(&self, entry: &LogEntry) {
        self.entries.borrow_mut().push(entry.clone());
    }

    fn snapshot(&self, _: &str, _: &DiskSnapshot) {}

    fn summary(&self, summary: &Summary) {
        self.summaries.borrow_mut().push(summary.clone());
    }
}

/// A journal writing into a fresh temp directory.
pub(crate) fn open_journal(reporter: &RecordingReporter) -> (TempDir, Journal<'_>) {
    let tmp = tempfile::tempdir().unwrap();
    let log = CleanupLog::create(&tmp.path().join("cleanup-test.log")).unwrap();
    (tmp, Journal::new(log, reporter))
}
