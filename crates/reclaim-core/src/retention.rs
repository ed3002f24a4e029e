//! Retention-bounded cleanup of project images.
//!
//! Keeps the `keep_count` newest tagged images of one repository and removes
//! the rest, one image at a time.

use crate::config::{ExecutionMode, RetentionPolicy};
use crate::engine::{Engine, ImageRecord, short_id};
use crate::error::ReclaimError;
use crate::journal::Journal;
use crate::stage::{StageOutcome, StageStatus};

/// Banner title of the retention stage.
pub const TITLE: &str = "Old project images";

/// Split of a repository's images into survivors and removal candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Newest images, retained.
    pub keep: Vec<ImageRecord>,
    /// Everything older, to be removed.
    pub remove: Vec<ImageRecord>,
}

/// Order `images` newest first and keep the first `keep_count`.
///
/// Untagged placeholders are dropped. The sort is stable, so images with
/// identical creation times stay in the order the engine listed them.
pub fn plan(images: Vec<ImageRecord>, keep_count: usize) -> RetentionPlan {
    let mut keep: Vec<ImageRecord> = images.into_iter().filter(ImageRecord::is_tagged).collect();
    keep.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let remove = if keep.len() > keep_count {
        keep.split_off(keep_count)
    } else {
        Vec::new()
    };
    RetentionPlan { keep, remove }
}

fn describe(image: &ImageRecord) -> String {
    format!(
        "{} ({}, created {})",
        image.reference(),
        short_id(&image.id),
        image.created_at.format("%Y-%m-%d %H:%M:%S %z")
    )
}

/// Run the retention stage.
///
/// # Errors
///
/// Returns [`ReclaimError::LogWrite`] if the journal cannot be written.
pub fn run(
    engine: &dyn Engine,
    policy: &RetentionPolicy,
    mode: ExecutionMode,
    journal: &mut Journal<'_>,
) -> Result<StageOutcome, ReclaimError> {
    let outcome = |status| StageOutcome {
        title: TITLE,
        status,
    };

    let Some(repository) = policy.repository() else {
        journal.info("No target image repository configured, skipping old image cleanup")?;
        return Ok(outcome(StageStatus::Skipped));
    };
    let keep_count = policy.keep_count();

    let images = match engine.repository_images(repository) {
        Ok(images) => images,
        Err(e) => {
            tracing::warn!("Unable to retrieve images for {repository}: {e}");
            Vec::new()
        }
    };

    let plan = plan(images, keep_count);
    let total = plan.keep.len() + plan.remove.len();
    if total == 0 {
        journal.info(format!("No images found for {repository}"))?;
        return Ok(outcome(StageStatus::Clean));
    }

    if plan.remove.is_empty() {
        journal.info(format!(
            "Found {total} images for {repository}, keeping all (limit {keep_count})"
        ))?;
        return Ok(outcome(StageStatus::Clean));
    }

    journal.info(format!(
        "Found {total} images for {repository}, keeping the {keep_count} most recent"
    ))?;
    for image in &plan.keep {
        journal.info(format!("  Keeping {}", describe(image)))?;
    }

    if mode.is_dry() {
        journal.info(format!(
            "[DRY RUN] Would remove {} old images:",
            plan.remove.len()
        ))?;
        for image in &plan.remove {
            journal.info(format!("  - {}", describe(image)))?;
        }
        return Ok(outcome(StageStatus::WouldRemove(plan.remove.len())));
    }

    let mut removed = 0;
    let mut failed = 0;
    for image in &plan.remove {
        match engine.remove_image(&image.id) {
            Ok(()) => {
                removed += 1;
                journal.success(format!("Removed old image {}", describe(image)))?;
            }
            Err(e) => {
                failed += 1;
                journal.warning(format!(
                    "Failed to remove old image {}: {e}",
                    describe(image)
                ))?;
            }
        }
    }
    Ok(outcome(StageStatus::Removed { removed, failed }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEngine, RecordingReporter, image, open_journal};

    fn ids(images: &[ImageRecord]) -> Vec<&str> {
        images.iter().map(|i| i.id.as_str()).collect()
    }

    fn series(count: usize) -> Vec<ImageRecord> {
        (0..count)
            .map(|i| {
                image(
                    "acme/web",
                    &format!("v{i}"),
                    &format!("id-{i}"),
                    &format!("2024-01-{:02}T00:00:00Z", i + 1),
                )
            })
            .collect()
    }

    #[test]
    fn test_keeps_newest_and_removes_oldest() {
        // T3 > T2 > T1, listed out of order
        let images = vec![
            image("acme/web", "b", "t2", "2024-02-01T00:00:00Z"),
            image("acme/web", "a", "t1", "2024-01-01T00:00:00Z"),
            image("acme/web", "c", "t3", "2024-03-01T00:00:00Z"),
        ];
        let plan = plan(images, 2);
        assert_eq!(ids(&plan.keep), vec!["t3", "t2"]);
        assert_eq!(ids(&plan.remove), vec!["t1"]);
    }

    #[test]
    fn test_candidate_count_for_every_size() {
        for keep in 1..5 {
            for n in 0..8 {
                let plan = plan(series(n), keep);
                let expected = n.saturating_sub(keep);
                assert_eq!(plan.remove.len(), expected, "n={n} keep={keep}");
                assert_eq!(plan.keep.len(), n - expected);

                // Every removal candidate is older than every survivor.
                if let (Some(youngest_removed), Some(oldest_kept)) =
                    (plan.remove.first(), plan.keep.last())
                {
                    assert!(youngest_removed.created_at <= oldest_kept.created_at);
                }
            }
        }
    }

    #[test]
    fn test_ties_keep_engine_order() {
        let images = vec![
            image("acme/web", "x", "first", "2024-01-01T00:00:00Z"),
            image("acme/web", "y", "second", "2024-01-01T00:00:00Z"),
            image("acme/web", "z", "third", "2024-01-01T00:00:00Z"),
        ];
        let plan = plan(images, 1);
        assert_eq!(ids(&plan.keep), vec!["first"]);
        assert_eq!(ids(&plan.remove), vec!["second", "third"]);
    }

    #[test]
    fn test_untagged_entries_ignored() {
        let images = vec![
            image("acme/web", "<none>", "untagged", "2024-05-01T00:00:00Z"),
            image("acme/web", "v1", "tagged", "2024-01-01T00:00:00Z"),
        ];
        let plan = plan(images, 1);
        assert_eq!(ids(&plan.keep), vec!["tagged"]);
        assert!(plan.remove.is_empty());
    }

    #[test]
    fn test_duplicate_tags_are_distinct() {
        let images = vec![
            image("acme/web", "latest", "new", "2024-02-01T00:00:00Z"),
            image("acme/web", "latest", "old", "2024-01-01T00:00:00Z"),
        ];
        let plan = plan(images, 1);
        assert_eq!(ids(&plan.remove), vec!["old"]);
    }

    #[test]
    fn test_empty_repository_skips() {
        let engine = FakeEngine::default().with_images(series(6));
        let reporter = RecordingReporter::default();
        let (_tmp, mut journal) = open_journal(&reporter);
        let policy = RetentionPolicy::new("", 1).unwrap();

        let outcome = run(&engine, &policy, ExecutionMode::Live, &mut journal).unwrap();

        assert_eq!(outcome.status, StageStatus::Skipped);
        assert!(engine.calls().is_empty());
        assert!(reporter.messages()[0].contains("skipping"));
    }

    #[test]
    fn test_live_removes_by_id_and_continues_after_failure() {
        let engine = FakeEngine::default()
            .with_images(series(5))
            .failing_removal("id-1");
        let reporter = RecordingReporter::default();
        let (_tmp, mut journal) = open_journal(&reporter);
        let policy = RetentionPolicy::new("acme/web", 2).unwrap();

        let outcome = run(&engine, &policy, ExecutionMode::Live, &mut journal).unwrap();

        // Newest are id-4 and id-3; the rest go, newest first.
        assert_eq!(engine.calls(), vec!["rmi id-2", "rmi id-1", "rmi id-0"]);
        assert_eq!(
            outcome.status,
            StageStatus::Removed {
                removed: 2,
                failed: 1
            }
        );
        assert_eq!(reporter.warnings().len(), 1);
    }

    #[test]
    fn test_dry_run_lists_candidates() {
        let engine = FakeEngine::default().with_images(series(4));
        let reporter = RecordingReporter::default();
        let (_tmp, mut journal) = open_journal(&reporter);
        let policy = RetentionPolicy::new("acme/web", 3).unwrap();

        let outcome = run(&engine, &policy, ExecutionMode::Dry, &mut journal).unwrap();

        assert_eq!(outcome.status, StageStatus::WouldRemove(1));
        assert!(engine.calls().is_empty());
        let messages = reporter.messages();
        assert!(messages.contains(&"[DRY RUN] Would remove 1 old images:".to_string()));
        assert!(
            messages
                .iter()
                .any(|m| m.starts_with("  - acme/web:v0 (id-0, created 2024-01-01"))
        );
    }

    #[test]
    fn test_within_limit_keeps_all() {
        let engine = FakeEngine::default().with_images(series(2));
        let reporter = RecordingReporter::default();
        let (_tmp, mut journal) = open_journal(&reporter);
        let policy = RetentionPolicy::new("acme/web", 3).unwrap();

        let outcome = run(&engine, &policy, ExecutionMode::Live, &mut journal).unwrap();

        assert_eq!(outcome.status, StageStatus::Clean);
        assert!(engine.calls().is_empty());
        assert!(reporter.messages()[0].contains("keeping all"));
    }
}
