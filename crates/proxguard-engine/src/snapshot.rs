//! Entity snapshot construction with staleness handling.
//!
//! [`SnapshotBuilder`] persists across ticks and keeps the last-known-good
//! position per tracked entity, in the manner of a heartbeat monitor: a valid
//! finite pose refreshes the entity's entry, and an entity that stays absent
//! or invalid beyond the staleness window is evicted and stops contributing
//! to every zone.  Within the window the retained pose keeps contributing, so
//! brief tracking loss (a routine condition in VR) does not flap zone levels.
//!
//! Each call to [`SnapshotBuilder::ingest`] yields an [`EntitySnapshot`], the
//! immutable per-tick view consumed by the evaluator.  Non-finite positions
//! (NaN/∞) are logged and excluded, never fatal.

use std::collections::HashMap;

use proxguard_types::{EntityClass, Point3, PoseSample};
use tracing::{debug, warn};

// ────────────────────────────────────────────────────────────────────────────
// Per-tick view
// ────────────────────────────────────────────────────────────────────────────

/// One entity as seen by the evaluator for a single tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntity {
    pub id: String,
    pub position: Point3,
    /// Diagnostic class tag; never affects scoring.
    pub class: EntityClass,
}

/// Immutable per-tick mapping of tracked entities to validated poses.
///
/// Entities are ordered by id so that score ties resolve deterministically.
#[derive(Debug, Clone, Default)]
pub struct EntitySnapshot {
    entities: Vec<SnapshotEntity>,
}

impl EntitySnapshot {
    /// The validated entities, sorted by id.
    pub fn entities(&self) -> &[SnapshotEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SnapshotBuilder
// ────────────────────────────────────────────────────────────────────────────

struct TrackedEntry {
    position: Point3,
    class: EntityClass,
    last_valid_tick: u64,
}

/// Builds the per-tick [`EntitySnapshot`] from raw pose samples, retaining
/// last-known-good poses across brief tracking loss.
pub struct SnapshotBuilder {
    stale_timeout_ticks: u64,
    entries: HashMap<String, TrackedEntry>,
}

impl SnapshotBuilder {
    /// Create a builder that evicts entities after `stale_timeout_ticks`
    /// ticks without a valid pose.
    pub fn new(stale_timeout_ticks: u64) -> Self {
        Self {
            stale_timeout_ticks,
            entries: HashMap::new(),
        }
    }

    /// Consume one tick's raw samples and return the validated snapshot plus
    /// the number of samples dropped for non-finite position data.
    ///
    /// Filtering rules:
    /// - samples whose source reports invalid tracking are skipped (the
    ///   entity's retained pose, if any, still contributes);
    /// - samples with NaN/∞ positions are logged at `warn` and skipped;
    /// - entities with no valid pose for more than the staleness window are
    ///   evicted entirely.
    pub fn ingest(&mut self, tick: u64, samples: &[PoseSample]) -> (EntitySnapshot, usize) {
        let mut invalid_poses = 0usize;

        for sample in samples {
            if !sample.validity.is_valid() {
                debug!(entity_id = %sample.entity_id, "tracking reported invalid, skipping sample");
                continue;
            }
            if !sample.position.is_finite() {
                warn!(
                    entity_id = %sample.entity_id,
                    "non-finite position in pose sample, entity excluded this tick"
                );
                invalid_poses += 1;
                continue;
            }
            self.entries.insert(
                sample.entity_id.clone(),
                TrackedEntry {
                    position: sample.position,
                    class: sample.class,
                    last_valid_tick: tick,
                },
            );
        }

        // Evict entities beyond the staleness window; no pose data is kept
        // longer than the timeout requires.
        let timeout = self.stale_timeout_ticks;
        self.entries
            .retain(|_, entry| tick.saturating_sub(entry.last_valid_tick) <= timeout);

        let mut entities: Vec<SnapshotEntity> = self
            .entries
            .iter()
            .map(|(id, entry)| SnapshotEntity {
                id: id.clone(),
                position: entry.position,
                class: entry.class,
            })
            .collect();
        entities.sort_by(|a, b| a.id.cmp(&b.id));

        (EntitySnapshot { entities }, invalid_poses)
    }

    /// Drop all retained pose history.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxguard_types::TrackingValidity;

    fn sample(id: &str, x: f32) -> PoseSample {
        PoseSample {
            entity_id: id.to_string(),
            position: Point3::new(x, 0.0, 0.0),
            validity: TrackingValidity::Valid,
            class: EntityClass::Head,
        }
    }

    fn invalid_sample(id: &str) -> PoseSample {
        PoseSample {
            validity: TrackingValidity::Invalid,
            ..sample(id, 0.0)
        }
    }

    #[test]
    fn valid_sample_appears_in_snapshot() {
        let mut builder = SnapshotBuilder::new(5);
        let (snapshot, invalid) = builder.ingest(1, &[sample("hmd", 1.0)]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.entities()[0].id, "hmd");
        assert_eq!(invalid, 0);
    }

    #[test]
    fn non_finite_position_is_counted_and_excluded() {
        let mut builder = SnapshotBuilder::new(5);
        let mut bad = sample("hmd", 0.0);
        bad.position = Point3::new(f32::NAN, 0.0, 0.0);
        let (snapshot, invalid) = builder.ingest(1, &[bad]);
        assert!(snapshot.is_empty());
        assert_eq!(invalid, 1);
    }

    #[test]
    fn invalid_tracking_sample_is_skipped_without_counting() {
        let mut builder = SnapshotBuilder::new(5);
        let (snapshot, invalid) = builder.ingest(1, &[invalid_sample("hmd")]);
        assert!(snapshot.is_empty());
        // Tracking loss is routine, not a pose-data error.
        assert_eq!(invalid, 0);
    }

    #[test]
    fn last_known_good_survives_brief_tracking_loss() {
        let mut builder = SnapshotBuilder::new(3);
        builder.ingest(1, &[sample("hmd", 2.5)]);

        // Three ticks of invalid tracking: still within the window.
        for tick in 2..=4 {
            let (snapshot, _) = builder.ingest(tick, &[invalid_sample("hmd")]);
            assert_eq!(snapshot.len(), 1, "tick {tick} should retain the entity");
            assert!((snapshot.entities()[0].position.x - 2.5).abs() < 1e-6);
        }
    }

    #[test]
    fn entity_evicted_after_stale_timeout() {
        let mut builder = SnapshotBuilder::new(3);
        builder.ingest(1, &[sample("hmd", 2.5)]);

        // Tick 5 is four ticks after the last valid pose: beyond the window.
        let (snapshot, _) = builder.ingest(5, &[]);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn fresh_pose_resets_staleness_clock() {
        let mut builder = SnapshotBuilder::new(2);
        builder.ingest(1, &[sample("hmd", 1.0)]);
        builder.ingest(3, &[sample("hmd", 1.5)]);

        let (snapshot, _) = builder.ingest(5, &[]);
        assert_eq!(snapshot.len(), 1);
        assert!((snapshot.entities()[0].position.x - 1.5).abs() < 1e-6);
    }

    #[test]
    fn snapshot_entities_sorted_by_id() {
        let mut builder = SnapshotBuilder::new(5);
        let (snapshot, _) = builder.ingest(
            1,
            &[sample("right_hand", 1.0), sample("hmd", 2.0), sample("left_hand", 3.0)],
        );
        let ids: Vec<&str> = snapshot.entities().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["hmd", "left_hand", "right_hand"]);
    }

    #[test]
    fn clear_drops_all_history() {
        let mut builder = SnapshotBuilder::new(5);
        builder.ingest(1, &[sample("hmd", 1.0)]);
        builder.clear();
        let (snapshot, _) = builder.ingest(2, &[]);
        assert!(snapshot.is_empty());
    }
}
