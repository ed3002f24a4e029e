//! reclaim - disk-space reclamation for container hosts
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Removes stopped containers, old project images beyond a retention count,
//! dangling images, unused networks and volumes, and the build cache, then
//! prunes the engine. Every option can also be set from the environment.
//!
//! # Example
//!
//! ```text
//! DRY_RUN=true IMAGE_NAME=acme/web KEEP_IMAGES=5 reclaim
//! ```

pub mod crash;
pub mod ui;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use clap::builder::BoolishValueParser;
use reclaim_core::config::{DEFAULT_APP_NAME, DEFAULT_KEEP_IMAGES};
use reclaim_core::{DockerCli, Reclaimer, Settings, Summary};
use std::path::PathBuf;

/// Command line and environment configuration.
#[derive(Debug, Parser)]
#[command(name = "reclaim")]
#[command(author, version, about = "Reclaim disk space on a container host")]
pub struct Cli {
    /// Label used in log messages
    #[arg(long, env = "APP_NAME", default_value = DEFAULT_APP_NAME)]
    pub app_name: String,

    /// Number of most recent project images to keep
    #[arg(long, env = "KEEP_IMAGES", default_value_t = DEFAULT_KEEP_IMAGES)]
    pub keep_images: usize,

    /// Image repository the retention stage is scoped to (empty disables it)
    #[arg(long = "image", env = "IMAGE_NAME", default_value = "")]
    pub image: String,

    /// Show what would be removed without removing anything
    #[arg(
        long,
        env = "DRY_RUN",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub dry_run: bool,

    /// Directory for the cleanup log (defaults to the system temp dir)
    #[arg(long, env = "CLEANUP_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Container engine CLI to use instead of `docker` on PATH
    #[arg(long = "docker", env = "DOCKER_BIN")]
    pub docker: Option<PathBuf>,
}

impl Cli {
    /// Validate into core settings.
    pub fn settings(&self) -> Result<Settings> {
        Settings::new(
            &self.app_name,
            self.keep_images,
            &self.image,
            self.dry_run,
            self.log_dir.clone(),
        )
        .context("Invalid configuration")
    }
}

/// Run a full cleanup with console output.
pub fn run(cli: &Cli) -> Result<Summary> {
    let settings = cli.settings()?;
    let engine = DockerCli::locate(cli.docker.as_deref())
        .context("Container engine CLI is not available")?;
    tracing::debug!(
        "Starting {} cleanup with {}",
        settings.mode,
        engine.program().display()
    );

    let output = ui::Output::new();
    let summary = Reclaimer::new(&settings, &engine, &output)
        .run()
        .context("Cleanup aborted")?;
    Ok(summary)
}
