//! Final log line for a run that panics.
//!
//! Release builds abort on panic, so the journal never gets to write its own
//! abort line. The hook installed here appends one to the active cleanup log
//! before the previous hook runs.

use reclaim_core::journal::stamp;
use reclaim_core::{Level, LogEntry};
use std::fs::OpenOptions;
use std::io::Write;
use std::panic::{self, PanicHookInfo};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static ACTIVE_LOG: OnceLock<PathBuf> = OnceLock::new();

/// Remember the cleanup log of the current run.
pub fn remember_log(path: &Path) {
    let _ = ACTIVE_LOG.set(path.to_path_buf());
}

/// Chain a hook that records panics in the active cleanup log.
pub fn install_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if let Some(path) = ACTIVE_LOG.get() {
            let _ = append_abort_line(path, &panic_message(info));
        }
        previous(info);
    }));
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    match info.location() {
        Some(location) => format!("{payload} at {location}"),
        None => payload,
    }
}

/// Append an `ERROR:` line to the log at `path`.
pub(crate) fn append_abort_line(path: &Path, reason: &str) -> std::io::Result<()> {
    let entry = LogEntry {
        stamp: stamp(),
        level: Level::Error,
        message: format!("Cleanup aborted: {reason}"),
    };
    let mut file = OpenOptions::new().append(true).open(path)?;
    writeln!(file, "{entry}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_abort_line_is_appended() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("cleanup-1.log");
        std::fs::write(&path, "[2024-01-01 00:00:00] Starting cleanup\n").unwrap();

        append_abort_line(&path, "boom at src/main.rs:1:1").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("ERROR: Cleanup aborted: boom at src/main.rs:1:1"));
    }

    #[test]
    fn test_abort_line_needs_existing_log() {
        let tmp = tempdir().unwrap();
        assert!(append_abort_line(&tmp.path().join("missing.log"), "boom").is_err());
    }
}
