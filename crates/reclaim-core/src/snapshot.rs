//! Disk-usage snapshots taken before and after the cleanup stages.

use crate::engine::{DiskUsageRow, Engine, FilesystemUsage};

/// Engine and host usage at one point in time. A `None` half means the
/// query failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskSnapshot {
    /// Per-type engine usage.
    pub usage: Option<Vec<DiskUsageRow>>,
    /// Host filesystem backing the engine.
    pub filesystem: Option<FilesystemUsage>,
}

impl DiskSnapshot {
    /// Query both halves. Failures are traced and leave that half empty.
    pub fn capture(engine: &dyn Engine) -> Self {
        let usage = engine
            .disk_usage()
            .map_err(|e| tracing::warn!("Unable to retrieve engine disk usage: {e}"))
            .ok();
        let filesystem = engine
            .filesystem_usage()
            .map_err(|e| tracing::warn!("Unable to retrieve filesystem usage: {e}"))
            .ok();
        Self { usage, filesystem }
    }

    /// True when both halves were retrieved.
    pub fn is_complete(&self) -> bool {
        self.usage.is_some() && self.filesystem.is_some()
    }

    /// Plain-text rendering for the log file.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(rows) = &self.usage {
            for row in rows {
                lines.push(format!(
                    "{}: {} total, {} active, {} ({} reclaimable)",
                    row.kind, row.total_count, row.active, row.size, row.reclaimable
                ));
            }
        }
        if let Some(fs) = &self.filesystem {
            lines.push(format!(
                "Filesystem {} on {}: {} used of {} ({}), {} available",
                fs.filesystem,
                fs.mount,
                format_size(fs.used_kb * 1024),
                format_size(fs.size_kb * 1024),
                fs.capacity,
                format_size(fs.available_kb * 1024),
            ));
        }
        lines
    }
}

/// Host bytes released between two snapshots; negative if usage grew.
pub fn freed_bytes(before: &DiskSnapshot, after: &DiskSnapshot) -> Option<i64> {
    let before = before.filesystem.as_ref()?;
    let after = after.filesystem.as_ref()?;
    Some((before.used_kb as i64 - after.used_kb as i64) * 1024)
}

/// Format bytes for human-readable display
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs(used_kb: u64) -> FilesystemUsage {
        FilesystemUsage {
            filesystem: "/dev/sda1".into(),
            mount: "/".into(),
            size_kb: 10 * 1024 * 1024,
            used_kb,
            available_kb: 10 * 1024 * 1024 - used_kb,
            capacity: "50%".into(),
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024 * 5), "5.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_freed_bytes() {
        let before = DiskSnapshot {
            usage: None,
            filesystem: Some(fs(4096)),
        };
        let after = DiskSnapshot {
            usage: None,
            filesystem: Some(fs(1024)),
        };
        assert_eq!(freed_bytes(&before, &after), Some(3 * 1024 * 1024));
        assert_eq!(freed_bytes(&after, &before), Some(-3 * 1024 * 1024));
        assert_eq!(freed_bytes(&before, &DiskSnapshot::default()), None);
    }

    #[test]
    fn test_lines() {
        let snapshot = DiskSnapshot {
            usage: Some(vec![DiskUsageRow {
                kind: "Images".into(),
                total_count: 4,
                active: 1,
                size: "2GB".into(),
                reclaimable: "1.5GB (75%)".into(),
            }]),
            filesystem: Some(fs(1024 * 1024)),
        };
        let lines = snapshot.lines();
        assert_eq!(lines[0], "Images: 4 total, 1 active, 2GB (1.5GB (75%) reclaimable)");
        assert!(lines[1].starts_with("Filesystem /dev/sda1 on /: 1.0 GB used of 10.0 GB"));
        assert!(snapshot.is_complete());
    }
}
