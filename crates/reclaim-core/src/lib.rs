//! reclaim-core - disk-space reclamation for container hosts
//!
//! Inspects stopped containers, project images, dangling images, unused
//! networks and volumes, and the build cache, and removes what is no longer
//! needed. A dry run performs every inspection and writes the same audit
//! trail without issuing a single mutating engine call.
//!
//! # Architecture
//!
//! - **Engine seam**: [`Engine`] is the only contact with the container
//!   runtime. [`DockerCli`] drives the `docker` binary.
//! - **Stage descriptors**: [`stage::plan`] lists the stages in order; each
//!   is a query plus a removal action, iterated by the [`Reclaimer`].
//! - **Journal**: every line goes to the append-only cleanup log and to a
//!   [`Reporter`] for the console.

pub mod config;
pub mod engine;
pub mod error;
pub mod journal;
pub mod reclaimer;
pub mod reporter;
pub mod retention;
pub mod snapshot;
pub mod stage;
pub mod summary;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ExecutionMode, RetentionPolicy, Settings};
pub use engine::{DockerCli, Engine};
pub use error::{ConfigError, EngineError, ReclaimError};
pub use reclaimer::Reclaimer;
pub use reporter::{Level, LogEntry, NullReporter, Reporter};
pub use snapshot::DiskSnapshot;
pub use summary::Summary;
