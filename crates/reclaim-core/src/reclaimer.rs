//! The cleanup orchestrator.
//!
//! A run is strictly linear: snapshot, every [`Step`] of [`stage::plan`],
//! snapshot, summary. Stages never abort the run; only a journal failure
//! does.
//!
//! [`Step`]: crate::stage::Step

use crate::config::Settings;
use crate::engine::Engine;
use crate::error::ReclaimError;
use crate::journal::{self, CleanupLog, Journal};
use crate::reporter::Reporter;
use crate::retention;
use crate::snapshot::{self, DiskSnapshot};
use crate::stage::{self, StageOutcome, StageStatus, Step};
use crate::summary::Summary;

const SNAPSHOT_TITLE: &str = "Disk usage report";

/// Runs the cleanup stages against an engine.
pub struct Reclaimer<'a> {
    settings: &'a Settings,
    engine: &'a dyn Engine,
    reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for Reclaimer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reclaimer")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<'a> Reclaimer<'a> {
    /// Bind settings, engine and console reporter for one run.
    pub fn new(settings: &'a Settings, engine: &'a dyn Engine, reporter: &'a dyn Reporter) -> Self {
        Self {
            settings,
            engine,
            reporter,
        }
    }

    /// Execute every stage in order and return the summary.
    ///
    /// The log file is `<log_dir>/cleanup-<unix>.log`, named after the
    /// moment the run starts. Each run gets a fresh file; a second run in
    /// the same second writes `cleanup-<unix>-1.log`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReclaimError`] if the log cannot be created or written.
    /// A best-effort line naming the interrupted stage is appended first.
    pub fn run(&self) -> Result<Summary, ReclaimError> {
        let started = chrono::Utc::now().timestamp();
        let log = CleanupLog::for_run(&self.settings.log_dir, started)?;
        let mut journal = Journal::new(log, self.reporter);

        let mut during = "startup";
        match self.run_stages(&mut journal, &mut during) {
            Ok(summary) => Ok(summary),
            Err(e) => {
                tracing::error!("Cleanup aborted during {during}: {e}");
                journal.abort(during, &e);
                Err(e)
            }
        }
    }

    fn run_stages(
        &self,
        journal: &mut Journal<'_>,
        during: &mut &'static str,
    ) -> Result<Summary, ReclaimError> {
        let settings = self.settings;
        let mode = settings.mode;

        journal.info(format!(
            "Starting cleanup for {} ({mode})",
            settings.app_name
        ))?;
        journal.info(format!("Log file: {}", journal.path().display()))?;
        if mode.is_dry() {
            journal.info("[DRY RUN] No resources will be removed")?;
        }

        *during = "disk usage snapshot (before)";
        journal.section("Disk usage before cleanup")?;
        let before = DiskSnapshot::capture(self.engine);
        journal.snapshot("before", &before)?;

        let steps = stage::plan();
        let mut outcomes = Vec::with_capacity(steps.len() + 1);
        for step in &steps {
            *during = step.title();
            journal.section(step.title())?;
            let outcome = match step {
                Step::Sweep(stage) => stage::run_stage(stage, self.engine, mode, journal)?,
                Step::Retention => {
                    retention::run(self.engine, &settings.retention, mode, journal)?
                }
            };
            outcomes.push(outcome);
        }

        *during = "disk usage snapshot (after)";
        journal.section("Disk usage after cleanup")?;
        let after = DiskSnapshot::capture(self.engine);
        journal.snapshot("after", &after)?;
        outcomes.push(StageOutcome {
            title: SNAPSHOT_TITLE,
            status: if before.is_complete() && after.is_complete() {
                StageStatus::Captured
            } else {
                StageStatus::Unavailable
            },
        });

        *during = "summary";
        let summary = Summary {
            app_name: settings.app_name.clone(),
            mode,
            repository: settings.retention.repository().map(str::to_string),
            images_kept: settings.retention.keep_count(),
            log_path: journal.path().to_path_buf(),
            completed_at: journal::stamp(),
            freed_bytes: snapshot::freed_bytes(&before, &after),
            outcomes,
        };
        journal.info(format!("Cleanup completed for {}", settings.app_name))?;
        journal.summary(&summary)?;
        Ok(summary)
    }
}
