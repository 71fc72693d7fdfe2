use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A 3-D point in the zone's reference frame (metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    /// Create a new point.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The origin.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// True when all three components are finite (no NaN/∞).
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Discrete risk level of a safety zone.
///
/// Levels are totally ordered: `Safe < Warning < Critical`.  A zone moves at
/// most one level per evaluation tick in either direction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum RiskLevel {
    /// No entity is meaningfully close to the zone.
    #[default]
    Safe,
    /// An entity has crossed the warning threshold.
    Warning,
    /// An entity has crossed the critical threshold.
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Safe => write!(f, "safe"),
            RiskLevel::Warning => write!(f, "warning"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Class of a tracked entity (headset, hand controller, carried equipment).
///
/// Carried on pose samples and events for diagnostics only; the risk formula
/// treats every class identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityClass {
    Head,
    Controller,
    Equipment,
    #[default]
    Unknown,
}

/// Tracking quality reported by the pose source for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingValidity {
    /// The pose is a live, trusted measurement.
    Valid,
    /// The source lost tracking; the position must not be used.
    Invalid,
}

impl TrackingValidity {
    pub fn is_valid(self) -> bool {
        matches!(self, TrackingValidity::Valid)
    }
}

/// One raw pose record handed to the engine for a single tick.
///
/// Samples are ephemeral: the engine consumes them during the tick and only
/// retains a last-known-good position for the staleness window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    /// Stable identifier of the tracked entity (e.g. a device serial).
    pub entity_id: String,
    /// Position in the zone reference frame.
    pub position: Point3,
    /// Tracking quality reported by the source.
    pub validity: TrackingValidity,
    /// Diagnostic class tag.
    pub class: EntityClass,
}

/// A spherical hazard region with proximity-risk thresholds.
///
/// The zone's *current level* is owned by the engine's risk state store, not
/// by this value; registering a zone hands its configuration over and the
/// caller keeps no aliased mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyZone {
    /// Unique identifier, stable for the zone's lifetime.
    pub id: String,
    /// Zone centre in the zone reference frame.
    pub center: Point3,
    /// Nominal extent of the zone (metres, > 0).
    pub radius: f32,
    /// Raw score at which `Safe` escalates to `Warning` (in [0, 1)).
    pub warning_threshold: f32,
    /// Raw score at which `Warning` escalates to `Critical` (in (warning, 1]).
    pub critical_threshold: f32,
    /// Margin subtracted from a threshold on the way *down*, preventing level
    /// chatter when the raw score oscillates near a boundary.
    pub hysteresis_margin: f32,
}

impl SafetyZone {
    /// Validate the zone's geometry and thresholds.
    ///
    /// Enforces `radius > 0`, `0 <= warning < critical <= 1` and
    /// `0 <= hysteresis_margin < warning`, all finite.
    pub fn validate(&self) -> Result<(), ProxError> {
        let invalid = |details: String| ProxError::InvalidThresholds {
            zone_id: self.id.clone(),
            details,
        };
        if !self.center.is_finite() {
            return Err(invalid("center must be finite".to_string()));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(invalid(format!(
                "radius {} must be finite and positive",
                self.radius
            )));
        }
        if !self.warning_threshold.is_finite()
            || !self.critical_threshold.is_finite()
            || !self.hysteresis_margin.is_finite()
        {
            return Err(invalid("thresholds must be finite".to_string()));
        }
        if self.warning_threshold < 0.0
            || self.warning_threshold >= self.critical_threshold
            || self.critical_threshold > 1.0
        {
            return Err(invalid(format!(
                "thresholds must satisfy 0 <= warning ({}) < critical ({}) <= 1",
                self.warning_threshold, self.critical_threshold
            )));
        }
        if self.hysteresis_margin < 0.0 || self.hysteresis_margin >= self.warning_threshold {
            return Err(invalid(format!(
                "hysteresis_margin {} must be in [0, warning_threshold)",
                self.hysteresis_margin
            )));
        }
        Ok(())
    }
}

/// A single risk-level transition, produced once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub id: Uuid,
    /// Zone that changed level.
    pub zone_id: String,
    pub previous_level: RiskLevel,
    pub new_level: RiskLevel,
    /// Evaluation tick on which the transition occurred (1-based).
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    /// Entity whose position produced the zone's worst-case score, or `None`
    /// when the zone eased off because no entity contributed at all.
    pub contributor: Option<String>,
}

impl RiskEvent {
    /// True when the new level is more severe than the previous one.
    pub fn is_escalation(&self) -> bool {
        self.new_level > self.previous_level
    }
}

/// Engine error type spanning registration misuse, pose-data problems, and
/// sink delivery failures.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProxError {
    #[error("duplicate zone id '{0}'")]
    DuplicateZoneId(String),

    #[error("zone '{0}' is not registered")]
    ZoneNotFound(String),

    #[error("invalid thresholds for zone '{zone_id}': {details}")]
    InvalidThresholds { zone_id: String, details: String },

    #[error("invalid pose data for entity '{entity_id}': {details}")]
    InvalidPoseData { entity_id: String, details: String },

    #[error("sink '{sink}' failed: {details}")]
    SinkDelivery { sink: String, details: String },

    #[error("engine is halted; call reset() before ticking again")]
    EngineHalted,
}
