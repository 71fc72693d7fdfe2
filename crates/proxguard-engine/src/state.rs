//! [`RiskStateStore`] – per-zone hysteresis risk-level state machine.
//!
//! Naive thresholding flaps rapidly when the raw score oscillates near a
//! boundary, so the discrete level is stabilised two ways:
//!
//! - **Hysteresis** – a level is *entered* at the nominal threshold but only
//!   *left* once the score drops below `threshold − hysteresis_margin`.
//! - **One step per tick** – `Safe → Warning → Critical` and back, never
//!   skipping a level, which bounds event volume and gives a deterministic,
//!   easily testable progression.
//!
//! # Example
//!
//! ```
//! use proxguard_engine::state::advance_level;
//! use proxguard_types::{Point3, RiskLevel, SafetyZone};
//!
//! let zone = SafetyZone {
//!     id: "z".to_string(),
//!     center: Point3::zero(),
//!     radius: 1.0,
//!     warning_threshold: 0.5,
//!     critical_threshold: 0.9,
//!     hysteresis_margin: 0.1,
//! };
//!
//! // 0.45 is below the 0.5 entry threshold but above the 0.4 exit threshold,
//! // so Warning holds.
//! assert_eq!(advance_level(RiskLevel::Safe, 0.45, &zone), RiskLevel::Safe);
//! assert_eq!(advance_level(RiskLevel::Warning, 0.45, &zone), RiskLevel::Warning);
//! ```

use std::collections::HashMap;

use proxguard_types::{ProxError, RiskLevel, SafetyZone};

// ────────────────────────────────────────────────────────────────────────────
// Transition rule
// ────────────────────────────────────────────────────────────────────────────

/// Advance `level` by at most one step given the raw score for this tick.
///
/// Upward transitions use the nominal thresholds; downward transitions use
/// the thresholds reduced by the zone's hysteresis margin.
pub fn advance_level(level: RiskLevel, score: f32, zone: &SafetyZone) -> RiskLevel {
    match level {
        RiskLevel::Safe if score >= zone.warning_threshold => RiskLevel::Warning,
        RiskLevel::Warning if score >= zone.critical_threshold => RiskLevel::Critical,
        RiskLevel::Critical if score < zone.critical_threshold - zone.hysteresis_margin => {
            RiskLevel::Warning
        }
        RiskLevel::Warning if score < zone.warning_threshold - zone.hysteresis_margin => {
            RiskLevel::Safe
        }
        unchanged => unchanged,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RiskStateStore
// ────────────────────────────────────────────────────────────────────────────

struct ZoneRiskState {
    level: RiskLevel,
    last_score: Option<f32>,
}

/// Holds the current risk level and hysteresis bookkeeping per zone.
///
/// Entries are created at `Safe` with an undefined score when a zone first
/// appears, and dropped when the zone is unregistered.
#[derive(Default)]
pub struct RiskStateStore {
    states: HashMap<String, ZoneRiskState>,
}

impl RiskStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile store entries with the live zone set: drop entries for
    /// removed zones, seed `Safe` entries for new ones.
    pub fn sync(&mut self, zones: &[SafetyZone]) {
        self.states
            .retain(|id, _| zones.iter().any(|z| &z.id == id));
        for zone in zones {
            self.states.entry(zone.id.clone()).or_insert(ZoneRiskState {
                level: RiskLevel::Safe,
                last_score: None,
            });
        }
    }

    /// Advance the zone's state machine one step and record the score.
    ///
    /// Returns `(previous_level, new_level)`.
    ///
    /// # Errors
    ///
    /// [`ProxError::ZoneNotFound`] when no entry exists for the zone.  The
    /// engine treats this as internal corruption and halts.
    pub fn advance(
        &mut self,
        zone: &SafetyZone,
        score: f32,
    ) -> Result<(RiskLevel, RiskLevel), ProxError> {
        let state = self
            .states
            .get_mut(&zone.id)
            .ok_or_else(|| ProxError::ZoneNotFound(zone.id.clone()))?;
        let previous = state.level;
        state.level = advance_level(previous, score, zone);
        state.last_score = Some(score);
        Ok((previous, state.level))
    }

    /// Current level of a zone, if tracked.
    pub fn level(&self, zone_id: &str) -> Option<RiskLevel> {
        self.states.get(zone_id).map(|s| s.level)
    }

    /// Raw score recorded on the zone's most recent evaluation, if any.
    pub fn last_score(&self, zone_id: &str) -> Option<f32> {
        self.states.get(zone_id).and_then(|s| s.last_score)
    }

    /// Return every tracked zone to `Safe` with an undefined score.
    pub fn reset(&mut self) {
        for state in self.states.values_mut() {
            state.level = RiskLevel::Safe;
            state.last_score = None;
        }
    }
}
