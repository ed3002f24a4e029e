//! Reporter trait for dependency injection
//!
//! This trait allows the cleanup run to report progress without being
//! coupled to a specific terminal implementation.

use crate::snapshot::DiskSnapshot;
use crate::summary::Summary;
use std::fmt;
use std::path::Path;

/// Severity of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Plain narrative.
    Info,
    /// A resource was removed or a prune completed.
    Success,
    /// Non-fatal failure; the run continues.
    Warning,
    /// Fatal failure; the run is aborting.
    Error,
}

/// One timestamped journal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Local time, `%Y-%m-%d %H:%M:%S`.
    pub stamp: String,
    /// Severity.
    pub level: Level,
    /// Message text without prefix.
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.level {
            Level::Info | Level::Success => "",
            Level::Warning => "WARNING: ",
            Level::Error => "ERROR: ",
        };
        write!(f, "[{}] {prefix}{}", self.stamp, self.message)
    }
}

/// Console side of the cleanup journal.
pub trait Reporter {
    /// The cleanup log for this run was created at `path`.
    fn log_opened(&self, _path: &Path) {}

    /// A new stage has started.
    fn section(&self, title: &str);

    /// A journal line was recorded.
    fn log(&self, entry: &LogEntry);

    /// A disk-usage snapshot was taken.
    fn snapshot(&self, label: &str, snapshot: &DiskSnapshot);

    /// The run finished.
    fn summary(&self, summary: &Summary);
}

/// A no-op reporter for silent runs (e.g. testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn log(&self, _: &LogEntry) {}
    fn snapshot(&self, _: &str, _: &DiskSnapshot) {}
    fn summary(&self, _: &Summary) {}
}
