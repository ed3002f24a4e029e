//! Container engine collaborator.
//!
//! The [`Engine`] trait is the only seam between the cleanup stages and the
//! host's container runtime. [`DockerCli`] drives the `docker` binary; tests
//! substitute an in-memory fake.

mod docker;

pub use docker::DockerCli;

use crate::error::EngineError;
use chrono::{DateTime, FixedOffset};

/// Placeholder the engine prints for a missing repository or tag.
pub const NONE_TAG: &str = "<none>";

/// Networks the engine creates itself and never allows to be removed.
pub const PREDEFINED_NETWORKS: [&str; 3] = ["bridge", "host", "none"];

/// `docker system df` row type for the build cache.
pub const BUILD_CACHE_KIND: &str = "Build Cache";

/// `docker system df` row type for volumes.
pub const VOLUMES_KIND: &str = "Local Volumes";

/// Read and mutate operations the cleanup stages need.
///
/// Every call blocks until the engine answers.
pub trait Engine {
    /// Containers in the exited state.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine cannot be queried.
    fn stopped_containers(&self) -> Result<Vec<ContainerRecord>, EngineError>;

    /// Remove one container by id.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine refuses or fails.
    fn remove_container(&self, id: &str) -> Result<(), EngineError>;

    /// Images belonging to `repository`, in the engine's listing order.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine cannot be queried.
    fn repository_images(&self, repository: &str) -> Result<Vec<ImageRecord>, EngineError>;

    /// Remove one image by id.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine refuses or fails.
    fn remove_image(&self, id: &str) -> Result<(), EngineError>;

    /// Untagged images not referenced by any tagged image.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine cannot be queried.
    fn dangling_images(&self) -> Result<Vec<ImageRecord>, EngineError>;

    /// User-defined networks with no attached containers.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine cannot be queried.
    fn unused_networks(&self) -> Result<Vec<NetworkRecord>, EngineError>;

    /// Remove one network by id.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine refuses or fails.
    fn remove_network(&self, id: &str) -> Result<(), EngineError>;

    /// Volumes not mounted by any container.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine cannot be queried.
    fn unused_volumes(&self) -> Result<Vec<VolumeRecord>, EngineError>;

    /// Remove one volume by name.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine refuses or fails.
    fn remove_volume(&self, name: &str) -> Result<(), EngineError>;

    /// Drop the build cache.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the prune fails.
    fn prune_build_cache(&self) -> Result<PruneReport, EngineError>;

    /// Prune stopped containers, unused networks, dangling images and build
    /// cache in one call. Volumes are left alone.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the prune fails.
    fn prune_system(&self) -> Result<PruneReport, EngineError>;

    /// Aggregate usage per resource type.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine cannot be queried.
    fn disk_usage(&self) -> Result<Vec<DiskUsageRow>, EngineError>;

    /// Usage of the host filesystem backing the engine.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if `df` cannot be run or parsed.
    fn filesystem_usage(&self) -> Result<FilesystemUsage, EngineError>;
}

/// A stopped container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    /// Container id.
    pub id: String,
    /// Container name.
    pub name: String,
    /// Image the container was created from.
    pub image: String,
    /// Human status, e.g. `Exited (0) 2 hours ago`.
    pub status: String,
}

/// A locally cached image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Repository name, `<none>` when untagged.
    pub repository: String,
    /// Tag, `<none>` when untagged.
    pub tag: String,
    /// Image id.
    pub id: String,
    /// Creation time reported by the engine.
    pub created_at: DateTime<FixedOffset>,
    /// Human size, e.g. `120MB`.
    pub size: String,
}

impl ImageRecord {
    /// False for `<none>` placeholders.
    pub fn is_tagged(&self) -> bool {
        self.tag != NONE_TAG && self.repository != NONE_TAG
    }

    /// `repository:tag`.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

/// A network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRecord {
    /// Network id.
    pub id: String,
    /// Network name.
    pub name: String,
    /// Driver, e.g. `bridge`.
    pub driver: String,
}

/// A volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRecord {
    /// Volume name (its identifier).
    pub name: String,
    /// Driver, e.g. `local`.
    pub driver: String,
}

/// One row of the engine's aggregate disk usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskUsageRow {
    /// Resource type: `Images`, `Containers`, `Local Volumes`, `Build Cache`.
    pub kind: String,
    /// Number of objects.
    pub total_count: u64,
    /// Objects in use.
    pub active: u64,
    /// Human total size.
    pub size: String,
    /// Human reclaimable size, possibly with a percentage suffix.
    pub reclaimable: String,
}

impl DiskUsageRow {
    /// True unless the engine reports zero reclaimable bytes.
    pub fn has_reclaimable(&self) -> bool {
        let amount = self.reclaimable.split_whitespace().next().unwrap_or("");
        !amount.is_empty()
            && amount
                .trim_end_matches(|c: char| c.is_ascii_alphabetic())
                .parse::<f64>()
                .map_or(true, |value| value > 0.0)
    }
}

/// Host filesystem usage in KiB, as reported by `df -Pk`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemUsage {
    /// Device or filesystem name.
    pub filesystem: String,
    /// Mount point.
    pub mount: String,
    /// Total size in KiB.
    pub size_kb: u64,
    /// Used KiB.
    pub used_kb: u64,
    /// Available KiB.
    pub available_kb: u64,
    /// Capacity column, e.g. `42%`.
    pub capacity: String,
}

/// Result of a bulk prune.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Space the engine says it reclaimed, e.g. `1.2GB`.
    pub reclaimed: Option<String>,
}

/// First 12 characters of an id, without a `sha256:` prefix.
pub fn short_id(id: &str) -> &str {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    let end = id
        .char_indices()
        .nth(12)
        .map_or(id.len(), |(index, _)| index);
    &id[..end]
}
