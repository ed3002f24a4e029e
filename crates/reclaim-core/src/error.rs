//! Error types for engine access and cleanup runs.
//!
//! Engine errors never escape a stage: a failed query reads as "nothing
//! found" and a failed removal becomes a warning. Only [`ReclaimError`]
//! aborts a run.

use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the container engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine binary could not be located on `PATH`.
    #[error("'{program}' not found")]
    NotFound {
        /// Name or path that was looked up.
        program: String,
    },

    /// The engine binary exists but could not be spawned.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    Command {
        /// Rendered command line.
        command: String,
        /// Trimmed standard error of the command.
        stderr: String,
    },

    /// The command printed something we could not decode.
    #[error("unexpected output from `{command}`: {message}")]
    Parse {
        /// Rendered command line.
        command: String,
        /// What went wrong while decoding.
        message: String,
    },
}

/// Invalid configuration values.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Retention must keep at least one image.
    #[error("keep count must be at least 1 (got {0})")]
    KeepCount(usize),
}

/// Fatal failure that aborts a cleanup run.
#[derive(Error, Debug)]
pub enum ReclaimError {
    /// Configuration rejected before any stage ran.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The cleanup log could not be created.
    #[error("cannot create cleanup log {}: {source}", path.display())]
    LogCreate {
        /// Path of the log file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A line could not be appended to the cleanup log.
    #[error("cannot write cleanup log {}: {source}", path.display())]
    LogWrite {
        /// Path of the log file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The engine could not be reached at startup.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_message() {
        let err = EngineError::Command {
            command: "docker rmi abc".into(),
            stderr: "image is in use".into(),
        };
        assert_eq!(err.to_string(), "`docker rmi abc` failed: image is in use");
    }

    #[test]
    fn test_config_error_converts() {
        let err: ReclaimError = ConfigError::KeepCount(0).into();
        assert!(err.to_string().contains("at least 1"));
    }
}
