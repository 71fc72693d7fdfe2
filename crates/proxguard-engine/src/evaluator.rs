//! Pure proximity-risk scoring.
//!
//! For one zone and one entity the raw score is
//! `clamp(1 − distance / radius, 0, 1)`: 1 at the zone centre, falling
//! linearly to 0 at the radius and beyond.  A zone's per-tick score is the
//! **maximum** over all valid entities, because the worst case governs safety
//! decisions; a zone with no valid entities scores exactly 0.
//!
//! Everything here is a pure function of its inputs.  Identical inputs yield
//! identical output, which is what makes the state machine deterministic and
//! testable.
//!
//! # Example
//!
//! ```
//! use proxguard_engine::evaluator::proximity_score;
//! use proxguard_types::Point3;
//!
//! // Entity 0.3 m from the centre of a 1 m zone.
//! let score = proximity_score(Point3::zero(), 1.0, Point3::new(0.3, 0.0, 0.0));
//! assert!((score - 0.7).abs() < 1e-5);
//! ```

use proxguard_types::{Point3, SafetyZone};

use crate::snapshot::EntitySnapshot;

/// A zone's tick-level evaluation result.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneScore {
    /// Worst-case raw risk score in [0, 1].
    pub score: f32,
    /// Entity that produced the maximum score, or `None` when no entity
    /// contributed a positive score.
    pub contributor: Option<String>,
}

/// Raw risk score for a single position against a zone's geometry.
///
/// Monotonically non-increasing in distance from `center`; always in [0, 1].
pub fn proximity_score(center: Point3, radius: f32, position: Point3) -> f32 {
    (1.0 - center.distance(position) / radius).clamp(0.0, 1.0)
}

/// Evaluate `zone` against every entity in `snapshot`, reducing via maximum.
///
/// Snapshot entities are ordered by id, and only a strictly greater score
/// replaces the running maximum, so score ties resolve to the first id.
pub fn evaluate_zone(zone: &SafetyZone, snapshot: &EntitySnapshot) -> ZoneScore {
    let mut best = ZoneScore {
        score: 0.0,
        contributor: None,
    };
    for entity in snapshot.entities() {
        let score = proximity_score(zone.center, zone.radius, entity.position);
        if score > best.score {
            best.score = score;
            best.contributor = Some(entity.id.clone());
        }
    }
    best
}
