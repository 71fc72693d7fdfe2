//! [`ZoneRegistry`] – owns the set of safety zones and their static geometry.
//!
//! Zones are kept in insertion order, which is the deterministic evaluation
//! (and event dispatch) order for every tick.  Registration and removal
//! requests are validated synchronously but only *buffered*; the engine calls
//! [`ZoneRegistry::apply_pending`] at each tick boundary so the evaluator
//! always sees a stable zone set for the whole tick.
//!
//! # Example
//!
//! ```
//! use proxguard_engine::registry::ZoneRegistry;
//! use proxguard_types::{Point3, SafetyZone};
//!
//! let mut registry = ZoneRegistry::new();
//! registry.register(SafetyZone {
//!     id: "press_brake".to_string(),
//!     center: Point3::zero(),
//!     radius: 1.0,
//!     warning_threshold: 0.4,
//!     critical_threshold: 0.8,
//!     hysteresis_margin: 0.1,
//! }).unwrap();
//!
//! // Buffered until the next tick boundary.
//! assert!(registry.zones().is_empty());
//! registry.apply_pending();
//! assert_eq!(registry.zones().len(), 1);
//! ```

use proxguard_types::{ProxError, SafetyZone};
use tracing::info;

// ────────────────────────────────────────────────────────────────────────────
// Pending operations
// ────────────────────────────────────────────────────────────────────────────

enum PendingOp {
    Add(SafetyZone),
    Remove(String),
}

// ────────────────────────────────────────────────────────────────────────────
// ZoneRegistry
// ────────────────────────────────────────────────────────────────────────────

/// Insertion-ordered safety-zone set with apply-at-boundary mutation.
#[derive(Default)]
pub struct ZoneRegistry {
    zones: Vec<SafetyZone>,
    pending: Vec<PendingOp>,
}

impl ZoneRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request registration of `zone`.
    ///
    /// The zone is validated and checked for duplicates against the
    /// *effective* set (live zones plus buffered additions, minus buffered
    /// removals); errors are returned synchronously.  The structural change
    /// itself takes effect at the next [`ZoneRegistry::apply_pending`].
    ///
    /// # Errors
    ///
    /// [`ProxError::InvalidThresholds`] when the zone's geometry or
    /// thresholds are out of range, [`ProxError::DuplicateZoneId`] when the
    /// id is already taken.
    pub fn register(&mut self, zone: SafetyZone) -> Result<(), ProxError> {
        zone.validate()?;
        if self.contains_effective(&zone.id) {
            return Err(ProxError::DuplicateZoneId(zone.id));
        }
        info!(zone_id = %zone.id, radius = zone.radius, "zone registration queued");
        self.pending.push(PendingOp::Add(zone));
        Ok(())
    }

    /// Request removal of the zone with the given id.
    ///
    /// # Errors
    ///
    /// [`ProxError::ZoneNotFound`] when no zone with `id` exists in the
    /// effective set.
    pub fn unregister(&mut self, id: &str) -> Result<(), ProxError> {
        if !self.contains_effective(id) {
            return Err(ProxError::ZoneNotFound(id.to_string()));
        }
        info!(zone_id = %id, "zone removal queued");
        self.pending.push(PendingOp::Remove(id.to_string()));
        Ok(())
    }

    /// The live zones in insertion order.  Stable for the duration of a tick.
    pub fn zones(&self) -> &[SafetyZone] {
        &self.zones
    }

    /// Number of live zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// True when no zones are live.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Apply all buffered operations, in request order.
    ///
    /// Called by the engine at each tick boundary.  A zone removed and
    /// re-registered within the same window re-enters at the *end* of the
    /// evaluation order.
    pub fn apply_pending(&mut self) {
        for op in self.pending.drain(..) {
            match op {
                PendingOp::Add(zone) => self.zones.push(zone),
                PendingOp::Remove(id) => self.zones.retain(|z| z.id != id),
            }
        }
    }

    // Membership in the effective set: live zones with buffered ops replayed.
    fn contains_effective(&self, id: &str) -> bool {
        let mut present = self.zones.iter().any(|z| z.id == id);
        for op in &self.pending {
            match op {
                PendingOp::Add(zone) if zone.id == id => present = true,
                PendingOp::Remove(removed) if removed == id => present = false,
                _ => {}
            }
        }
        present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxguard_types::Point3;

    fn zone(id: &str) -> SafetyZone {
        SafetyZone {
            id: id.to_string(),
            center: Point3::zero(),
            radius: 1.0,
            warning_threshold: 0.4,
            critical_threshold: 0.8,
            hysteresis_margin: 0.1,
        }
    }

    #[test]
    fn registered_zone_appears_after_apply() {
        let mut registry = ZoneRegistry::new();
        registry.register(zone("a")).unwrap();
        assert!(registry.is_empty(), "mutation must wait for the boundary");

        registry.apply_pending();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.zones()[0].id, "a");
    }

    #[test]
    fn duplicate_id_rejected_and_registry_unchanged() {
        let mut registry = ZoneRegistry::new();
        registry.register(zone("a")).unwrap();
        registry.apply_pending();

        let result = registry.register(zone("a"));
        assert!(matches!(result, Err(ProxError::DuplicateZoneId(id)) if id == "a"));
        registry.apply_pending();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_against_pending_add_rejected() {
        let mut registry = ZoneRegistry::new();
        registry.register(zone("a")).unwrap();
        // Still buffered, but already claims the id.
        assert!(matches!(
            registry.register(zone("a")),
            Err(ProxError::DuplicateZoneId(_))
        ));
    }

    #[test]
    fn invalid_thresholds_rejected_at_registration() {
        let mut registry = ZoneRegistry::new();
        let mut bad = zone("a");
        bad.critical_threshold = 0.2; // below warning
        assert!(matches!(
            registry.register(bad),
            Err(ProxError::InvalidThresholds { .. })
        ));
        registry.apply_pending();
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_unknown_zone_fails() {
        let mut registry = ZoneRegistry::new();
        assert!(matches!(
            registry.unregister("ghost"),
            Err(ProxError::ZoneNotFound(_))
        ));
    }

    #[test]
    fn unregister_takes_effect_at_boundary() {
        let mut registry = ZoneRegistry::new();
        registry.register(zone("a")).unwrap();
        registry.apply_pending();

        registry.unregister("a").unwrap();
        assert_eq!(registry.len(), 1, "removal must wait for the boundary");
        registry.apply_pending();
        assert!(registry.is_empty());
    }

    #[test]
    fn reregister_after_pending_removal_is_allowed() {
        let mut registry = ZoneRegistry::new();
        registry.register(zone("a")).unwrap();
        registry.register(zone("b")).unwrap();
        registry.apply_pending();

        // Remove "a" and register it again before the boundary; the zone
        // re-enters at the end of the evaluation order.
        registry.unregister("a").unwrap();
        registry.register(zone("a")).unwrap();
        registry.apply_pending();

        let ids: Vec<&str> = registry.zones().iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut registry = ZoneRegistry::new();
        for id in ["left", "right", "overhead"] {
            registry.register(zone(id)).unwrap();
        }
        registry.apply_pending();
        let ids: Vec<&str> = registry.zones().iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, vec!["left", "right", "overhead"]);
    }
}
