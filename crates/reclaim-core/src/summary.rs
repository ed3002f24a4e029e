//! End-of-run summary.

use crate::config::ExecutionMode;
use crate::snapshot::format_size;
use crate::stage::StageOutcome;
use std::path::PathBuf;

/// How to repeat a dry run for real.
pub const LIVE_RERUN_HINT: &str =
    "To perform the cleanup, run again with DRY_RUN=false (or without --dry-run)";

/// Everything the final report shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Application label.
    pub app_name: String,
    /// Mode the run used.
    pub mode: ExecutionMode,
    /// Retention repository, `None` when the stage was disabled.
    pub repository: Option<String>,
    /// Configured number of project images kept.
    pub images_kept: usize,
    /// Cleanup log location.
    pub log_path: PathBuf,
    /// Local completion time.
    pub completed_at: String,
    /// Host bytes released between the snapshots, when both were taken.
    pub freed_bytes: Option<i64>,
    /// Per-stage outcomes in run order.
    pub outcomes: Vec<StageOutcome>,
}

impl Summary {
    /// True when no stage reported a failure.
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_ok())
    }

    /// Header lines: mode, retention, log, completion, freed space.
    pub fn header(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Cleanup summary for {}", self.app_name),
            format!("Mode: {}", self.mode),
        ];
        lines.push(match &self.repository {
            Some(repo) => format!("Images kept: {} most recent of {repo}", self.images_kept),
            None => format!("Images kept: {} (retention disabled)", self.images_kept),
        });
        lines.push(format!("Log file: {}", self.log_path.display()));
        lines.push(format!("Completed at: {}", self.completed_at));
        if let Some(freed) = self.freed_bytes {
            lines.push(if freed >= 0 {
                format!("Disk space freed: {}", format_size(freed.unsigned_abs()))
            } else {
                format!("Disk usage grew by: {}", format_size(freed.unsigned_abs()))
            });
        }
        lines
    }

    /// Checklist lines, one per stage.
    pub fn checklist(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .map(|o| {
                let mark = if o.status.is_ok() { "✓" } else { "⚠" };
                format!("{mark} {}: {}", o.title, o.status.describe())
            })
            .collect()
    }

    /// Re-run instruction, only for dry runs.
    pub fn hint(&self) -> Option<&'static str> {
        self.mode.is_dry().then_some(LIVE_RERUN_HINT)
    }

    /// Full plain-text rendering for the log file.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.header();
        lines.push("Completed stages:".to_string());
        lines.extend(self.checklist().into_iter().map(|l| format!("  {l}")));
        if let Some(hint) = self.hint() {
            lines.push(hint.to_string());
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageStatus;

    fn summary(mode: ExecutionMode) -> Summary {
        Summary {
            app_name: "shop".into(),
            mode,
            repository: Some("acme/web".into()),
            images_kept: 3,
            log_path: PathBuf::from("/tmp/cleanup-1.log"),
            completed_at: "2024-01-01 00:00:00".into(),
            freed_bytes: Some(2 * 1024 * 1024),
            outcomes: vec![
                StageOutcome {
                    title: "Stopped containers",
                    status: StageStatus::Removed {
                        removed: 2,
                        failed: 0,
                    },
                },
                StageOutcome {
                    title: "Unused volumes",
                    status: StageStatus::Removed {
                        removed: 1,
                        failed: 1,
                    },
                },
            ],
        }
    }

    #[test]
    fn test_live_summary_lines() {
        let summary = summary(ExecutionMode::Live);
        let lines = summary.lines();
        assert!(lines.contains(&"Mode: LIVE".to_string()));
        assert!(lines.contains(&"Images kept: 3 most recent of acme/web".to_string()));
        assert!(lines.contains(&"Disk space freed: 2.0 MB".to_string()));
        assert!(lines.contains(&"  ✓ Stopped containers: removed 2".to_string()));
        assert!(lines.contains(&"  ⚠ Unused volumes: removed 1, 1 failed".to_string()));
        assert!(summary.hint().is_none());
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_dry_summary_has_hint() {
        let summary = summary(ExecutionMode::Dry);
        assert_eq!(summary.lines().last().unwrap(), LIVE_RERUN_HINT);
    }
}
