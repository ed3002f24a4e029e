//! Stage descriptors and the generic inspect-then-act runner.
//!
//! A run is an ordered list of [`Step`]s. Most steps are plain [`Stage`]s:
//! a query listing candidates and a removal action. Image retention needs
//! ordering and a keep count, so it is its own step.

use crate::config::ExecutionMode;
use crate::engine::{
    BUILD_CACHE_KIND, ContainerRecord, Engine, ImageRecord, NetworkRecord, PruneReport,
    VOLUMES_KIND, VolumeRecord, short_id,
};
use crate::error::{EngineError, ReclaimError};
use crate::journal::Journal;

/// Something a stage found and may remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Identifier handed to the removal action.
    pub id: String,
    /// Human description for the journal.
    pub label: String,
}

impl From<ContainerRecord> for Candidate {
    fn from(c: ContainerRecord) -> Self {
        Self {
            label: format!("{} ({}, {}, {})", c.name, short_id(&c.id), c.image, c.status),
            id: c.id,
        }
    }
}

impl From<ImageRecord> for Candidate {
    fn from(i: ImageRecord) -> Self {
        Self {
            label: format!(
                "{} (created {}, {})",
                short_id(&i.id),
                i.created_at.format("%Y-%m-%d %H:%M:%S %z"),
                i.size
            ),
            id: i.id,
        }
    }
}

impl From<NetworkRecord> for Candidate {
    fn from(n: NetworkRecord) -> Self {
        Self {
            label: format!("{} ({}, {})", n.name, short_id(&n.id), n.driver),
            id: n.id,
        }
    }
}

impl From<VolumeRecord> for Candidate {
    fn from(v: VolumeRecord) -> Self {
        Self {
            label: format!("{} ({})", v.name, v.driver),
            id: v.name,
        }
    }
}

/// Lists the candidates for a stage.
pub type Query = fn(&dyn Engine) -> Result<Vec<Candidate>, EngineError>;

/// How a stage removes what it found.
#[derive(Debug, Clone, Copy)]
pub enum Removal {
    /// One engine call per candidate; each failure is independent.
    Each(fn(&dyn Engine, &str) -> Result<(), EngineError>),
    /// A single bulk prune.
    Prune(fn(&dyn Engine) -> Result<PruneReport, EngineError>),
}

/// A generic cleanup stage.
#[derive(Debug, Clone, Copy)]
pub struct Stage {
    /// Banner title and summary label.
    pub title: &'static str,
    /// Plural noun used in "No ... found" / "Found N ...".
    pub noun: &'static str,
    /// Inspection.
    pub query: Query,
    /// Mutation, only issued in live mode.
    pub removal: Removal,
}

/// One entry in the ordered run plan.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// A generic query/remove stage.
    Sweep(Stage),
    /// Retention-bounded project image cleanup.
    Retention,
}

impl Step {
    /// Banner title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Sweep(stage) => stage.title,
            Self::Retention => crate::retention::TITLE,
        }
    }
}

/// What happened in one stage, for the summary checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// Nothing matched.
    Clean,
    /// Stage disabled by configuration.
    Skipped,
    /// Dry run listed this many candidates.
    WouldRemove(usize),
    /// Dry run found something a prune would release.
    WouldPrune,
    /// Live item-by-item removal.
    Removed {
        /// Successful removals.
        removed: usize,
        /// Failed removals.
        failed: usize,
    },
    /// Live prune succeeded.
    Pruned {
        /// Reclaimed space reported by the engine.
        reclaimed: Option<String>,
    },
    /// Live prune failed.
    PruneFailed,
    /// Both disk-usage snapshots were taken.
    Captured,
    /// At least one disk-usage query failed.
    Unavailable,
}

impl StageStatus {
    /// False when something went wrong in this stage.
    pub fn is_ok(&self) -> bool {
        !matches!(
            self,
            Self::Removed { failed: 1.., .. } | Self::PruneFailed | Self::Unavailable
        )
    }

    /// Short human description.
    pub fn describe(&self) -> String {
        match self {
            Self::Clean => "nothing to remove".to_string(),
            Self::Skipped => "skipped".to_string(),
            Self::WouldRemove(n) => format!("would remove {n}"),
            Self::WouldPrune => "would prune".to_string(),
            Self::Removed { removed, failed: 0 } => format!("removed {removed}"),
            Self::Removed { removed, failed } => format!("removed {removed}, {failed} failed"),
            Self::Pruned {
                reclaimed: Some(amount),
            } => format!("pruned, reclaimed {amount}"),
            Self::Pruned { reclaimed: None } => "pruned".to_string(),
            Self::PruneFailed => "prune failed".to_string(),
            Self::Captured => "captured".to_string(),
            Self::Unavailable => "partially unavailable".to_string(),
        }
    }
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    /// Stage title.
    pub title: &'static str,
    /// What happened.
    pub status: StageStatus,
}

/// The fixed run order between the two disk-usage snapshots.
pub fn plan() -> Vec<Step> {
    vec![
        Step::Sweep(Stage {
            title: "Stopped containers",
            noun: "stopped containers",
            query: |engine| {
                Ok(engine
                    .stopped_containers()?
                    .into_iter()
                    .map(Candidate::from)
                    .collect())
            },
            removal: Removal::Each(|engine, id| engine.remove_container(id)),
        }),
        Step::Retention,
        Step::Sweep(Stage {
            title: "Dangling images",
            noun: "dangling images",
            query: |engine| {
                Ok(engine
                    .dangling_images()?
                    .into_iter()
                    .map(Candidate::from)
                    .collect())
            },
            removal: Removal::Each(|engine, id| engine.remove_image(id)),
        }),
        Step::Sweep(Stage {
            title: "Unused networks",
            noun: "unused networks",
            query: |engine| {
                Ok(engine
                    .unused_networks()?
                    .into_iter()
                    .map(Candidate::from)
                    .collect())
            },
            removal: Removal::Each(|engine, id| engine.remove_network(id)),
        }),
        Step::Sweep(Stage {
            title: "Unused volumes",
            noun: "unused volumes",
            query: |engine| {
                Ok(engine
                    .unused_volumes()?
                    .into_iter()
                    .map(Candidate::from)
                    .collect())
            },
            removal: Removal::Each(|engine, name| engine.remove_volume(name)),
        }),
        Step::Sweep(Stage {
            title: "Build cache",
            noun: "build cache",
            query: |engine| {
                Ok(engine
                    .disk_usage()?
                    .into_iter()
                    .filter(|row| row.kind == BUILD_CACHE_KIND && row.total_count > 0)
                    .map(|row| Candidate {
                        label: format!(
                            "{} cache entries, {} ({} reclaimable)",
                            row.total_count, row.size, row.reclaimable
                        ),
                        id: row.kind,
                    })
                    .collect())
            },
            removal: Removal::Prune(|engine| engine.prune_build_cache()),
        }),
        Step::Sweep(Stage {
            title: "System prune",
            noun: "reclaimable space",
            query: |engine| {
                Ok(engine
                    .disk_usage()?
                    .into_iter()
                    .filter(|row| row.kind != VOLUMES_KIND && row.has_reclaimable())
                    .map(|row| Candidate {
                        label: format!("{}: {} reclaimable", row.kind, row.reclaimable),
                        id: row.kind,
                    })
                    .collect())
            },
            removal: Removal::Prune(|engine| engine.prune_system()),
        }),
    ]
}

/// Run one generic stage.
///
/// Query failures read as "none found" in the journal and are traced at
/// `warn`. Removal failures are warnings; every candidate is attempted.
///
/// # Errors
///
/// Returns [`ReclaimError::LogWrite`] if the journal cannot be written.
pub fn run_stage(
    stage: &Stage,
    engine: &dyn Engine,
    mode: ExecutionMode,
    journal: &mut Journal<'_>,
) -> Result<StageOutcome, ReclaimError> {
    let outcome = |status| StageOutcome {
        title: stage.title,
        status,
    };

    let candidates = match (stage.query)(engine) {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::warn!("Unable to retrieve {}: {e}", stage.noun);
            Vec::new()
        }
    };

    if candidates.is_empty() {
        journal.info(format!("No {} found", stage.noun))?;
        return Ok(outcome(StageStatus::Clean));
    }

    match stage.removal {
        Removal::Each(remove) => {
            journal.info(format!("Found {} {}", candidates.len(), stage.noun))?;

            if mode.is_dry() {
                journal.info(format!(
                    "[DRY RUN] Would remove {} {}:",
                    candidates.len(),
                    stage.noun
                ))?;
                for candidate in &candidates {
                    journal.info(format!("  - {}", candidate.label))?;
                }
                return Ok(outcome(StageStatus::WouldRemove(candidates.len())));
            }

            let mut removed = 0;
            let mut failed = 0;
            for candidate in &candidates {
                match remove(engine, &candidate.id) {
                    Ok(()) => {
                        removed += 1;
                        journal.success(format!("Removed {}", candidate.label))?;
                    }
                    Err(e) => {
                        failed += 1;
                        journal.warning(format!("Failed to remove {}: {e}", candidate.label))?;
                    }
                }
            }
            Ok(outcome(StageStatus::Removed { removed, failed }))
        }
        Removal::Prune(prune) => {
            journal.info(format!("Found {}:", stage.noun))?;
            for candidate in &candidates {
                journal.info(format!("  - {}", candidate.label))?;
            }

            if mode.is_dry() {
                journal.info(format!("[DRY RUN] Would prune {}", stage.noun))?;
                return Ok(outcome(StageStatus::WouldPrune));
            }

            match prune(engine) {
                Ok(report) => {
                    match &report.reclaimed {
                        Some(amount) => {
                            journal.success(format!("Pruned {}, reclaimed {amount}", stage.noun))?;
                        }
                        None => journal.success(format!("Pruned {}", stage.noun))?,
                    }
                    Ok(outcome(StageStatus::Pruned {
                        reclaimed: report.reclaimed,
                    }))
                }
                Err(e) => {
                    journal.warning(format!("Failed to prune {}: {e}", stage.noun))?;
                    Ok(outcome(StageStatus::PruneFailed))
                }
            }
        }
    }
}
