//! Run configuration.
//!
//! Values are resolved once at startup and handed to the [`Reclaimer`]
//! explicitly; nothing in this crate reads the environment after that.
//!
//! [`Reclaimer`]: crate::Reclaimer

use crate::error::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default label used in log messages.
pub const DEFAULT_APP_NAME: &str = "my-app";

/// Default number of project images to retain.
pub const DEFAULT_KEEP_IMAGES: usize = 3;

/// Whether mutating engine calls are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Inspect and log only.
    Dry,
    /// Inspect, log and remove.
    Live,
}

impl ExecutionMode {
    /// Map the `dry_run` flag onto a mode.
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { Self::Dry } else { Self::Live }
    }

    /// True for [`ExecutionMode::Dry`].
    pub fn is_dry(self) -> bool {
        self == Self::Dry
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dry => f.write_str("DRY RUN"),
            Self::Live => f.write_str("LIVE"),
        }
    }
}

/// Which project images survive the retention stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    repository: String,
    keep_count: usize,
}

impl RetentionPolicy {
    /// Build a policy. An empty `repository` disables the retention stage.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KeepCount`] when `keep_count` is zero.
    pub fn new(repository: impl Into<String>, keep_count: usize) -> Result<Self, ConfigError> {
        if keep_count == 0 {
            return Err(ConfigError::KeepCount(keep_count));
        }
        Ok(Self {
            repository: repository.into().trim().to_string(),
            keep_count,
        })
    }

    /// Repository the stage is scoped to, `None` when disabled.
    pub fn repository(&self) -> Option<&str> {
        if self.repository.is_empty() {
            None
        } else {
            Some(&self.repository)
        }
    }

    /// Number of newest images retained.
    pub fn keep_count(&self) -> usize {
        self.keep_count
    }
}

/// Immutable settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Label used in log messages and the summary.
    pub app_name: String,
    /// Image retention policy.
    pub retention: RetentionPolicy,
    /// Dry or live.
    pub mode: ExecutionMode,
    /// Directory receiving the cleanup log.
    pub log_dir: PathBuf,
}

impl Settings {
    /// Validate and assemble settings.
    ///
    /// `log_dir` defaults to the system temp directory and a blank app name
    /// falls back to [`DEFAULT_APP_NAME`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the keep count is zero.
    pub fn new(
        app_name: &str,
        keep_images: usize,
        image_repository: &str,
        dry_run: bool,
        log_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let app_name = match app_name.trim() {
            "" => DEFAULT_APP_NAME,
            name => name,
        };

        Ok(Self {
            app_name: app_name.to_string(),
            retention: RetentionPolicy::new(image_repository, keep_images)?,
            mode: ExecutionMode::from_dry_run(dry_run),
            log_dir: log_dir.unwrap_or_else(std::env::temp_dir),
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            retention: RetentionPolicy {
                repository: String::new(),
                keep_count: DEFAULT_KEEP_IMAGES,
            },
            mode: ExecutionMode::Live,
            log_dir: std::env::temp_dir(),
        }
    }
}

/// Cleanup log path for a run started at `started_unix`: `<dir>/cleanup-<unix>.log`.
///
/// A non-zero `attempt` adds a suffix (`cleanup-<unix>-<attempt>.log`) for
/// runs that start within the same second.
pub fn log_path(dir: &Path, started_unix: i64, attempt: u32) -> PathBuf {
    match attempt {
        0 => dir.join(format!("cleanup-{started_unix}.log")),
        n => dir.join(format!("cleanup-{started_unix}-{n}.log")),
    }
}
