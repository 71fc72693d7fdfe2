//! [`ProximityEngine`] – the per-frame entry point.
//!
//! One call to [`ProximityEngine::tick`] runs the full evaluation cycle:
//!
//! 1. **Apply** – buffered zone registrations/removals take effect, and the
//!    risk state store is reconciled with the live zone set.
//! 2. **Snapshot** – raw pose samples are validated and merged with retained
//!    last-known-good poses.
//! 3. **Evaluate** – every zone is scored in registration order via the pure
//!    evaluator (maximum over entities).
//! 4. **Transition** – each zone's state machine advances at most one level.
//! 5. **Dispatch** – transitions become [`RiskEvent`]s delivered synchronously
//!    to every subscribed sink; failures are collected into the report.
//!
//! A tick either completes fully or, on internal state corruption, the engine
//! halts and refuses further ticks until [`ProximityEngine::reset`]; partial
//! ticks are never surfaced to sinks.  The same engine serves any tracking
//! backend that can yield a per-tick pose sequence.
//!
//! # Example
//!
//! ```
//! use proxguard_engine::{EngineConfig, ProximityEngine};
//! use proxguard_types::{EntityClass, Point3, PoseSample, SafetyZone, TrackingValidity};
//!
//! let mut engine = ProximityEngine::new(EngineConfig::default());
//! engine.register_zone(SafetyZone {
//!     id: "press_brake".to_string(),
//!     center: Point3::zero(),
//!     radius: 1.0,
//!     warning_threshold: 0.4,
//!     critical_threshold: 0.8,
//!     hysteresis_margin: 0.1,
//! }).unwrap();
//!
//! let report = engine.tick(&[PoseSample {
//!     entity_id: "hmd".to_string(),
//!     position: Point3::new(0.3, 0.0, 0.0),
//!     validity: TrackingValidity::Valid,
//!     class: EntityClass::Head,
//! }]).unwrap();
//!
//! // Raw score 0.7 crosses the 0.4 warning threshold on the first tick.
//! assert_eq!(report.events.len(), 1);
//! ```

use chrono::Utc;
use proxguard_types::{PoseSample, ProxError, RiskEvent, RiskLevel, SafetyZone};
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::dispatch::{EventDispatcher, RiskSink, SinkFailure};
use crate::evaluator::{ZoneScore, evaluate_zone};
use crate::registry::ZoneRegistry;
use crate::snapshot::SnapshotBuilder;
use crate::state::RiskStateStore;

// ─────────────────────────────────────────────────────────────────────────────
// Tick report
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the host needs to know about one completed tick.
#[derive(Debug, Default)]
pub struct TickReport {
    /// The tick number this report describes (1-based, monotonic).
    pub tick: u64,
    /// Level transitions, in zone-registration order.
    pub events: Vec<RiskEvent>,
    /// Sink delivery failures collected during dispatch.
    pub sink_failures: Vec<SinkFailure>,
    /// Samples dropped this tick for non-finite position data.
    pub invalid_poses: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// ProximityEngine
// ─────────────────────────────────────────────────────────────────────────────

/// Frame-driven proximity-risk engine.
///
/// Owns the zone registry, the snapshot builder, the per-zone risk state, and
/// the event dispatcher.  Single-threaded by construction: each tick consumes
/// a fresh, exclusively-owned snapshot, so no locking is required.
pub struct ProximityEngine {
    registry: ZoneRegistry,
    snapshots: SnapshotBuilder,
    states: RiskStateStore,
    dispatcher: EventDispatcher,
    tick: u64,
    halted: bool,
}

impl ProximityEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: ZoneRegistry::new(),
            snapshots: SnapshotBuilder::new(config.stale_timeout_ticks()),
            states: RiskStateStore::new(),
            dispatcher: EventDispatcher::new(),
            tick: 0,
            halted: false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Zone management
    // ─────────────────────────────────────────────────────────────────────

    /// Request registration of a zone; takes effect at the next tick.
    ///
    /// # Errors
    ///
    /// [`ProxError::DuplicateZoneId`] or [`ProxError::InvalidThresholds`],
    /// returned synchronously.
    pub fn register_zone(&mut self, zone: SafetyZone) -> Result<(), ProxError> {
        self.registry.register(zone)
    }

    /// Request removal of a zone; takes effect at the next tick.
    ///
    /// # Errors
    ///
    /// [`ProxError::ZoneNotFound`] when the id is unknown.
    pub fn unregister_zone(&mut self, id: &str) -> Result<(), ProxError> {
        self.registry.unregister(id)
    }

    /// The live zones in registration (evaluation) order.
    pub fn list_zones(&self) -> &[SafetyZone] {
        self.registry.zones()
    }

    /// Current risk level of a zone, if it is live.
    pub fn zone_level(&self, id: &str) -> Option<RiskLevel> {
        self.states.level(id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sink management
    // ─────────────────────────────────────────────────────────────────────

    /// Subscribe a sink for risk-event delivery.
    pub fn subscribe(&mut self, sink: Box<dyn RiskSink>) {
        self.dispatcher.subscribe(sink);
    }

    /// Remove the sink with the given name; returns `true` when one existed.
    pub fn unsubscribe(&mut self, name: &str) -> bool {
        self.dispatcher.unsubscribe(name)
    }

    // ─────────────────────────────────────────────────────────────────────
    // The tick
    // ─────────────────────────────────────────────────────────────────────

    /// Run one full evaluation cycle over this frame's pose samples.
    ///
    /// # Errors
    ///
    /// [`ProxError::EngineHalted`] when a previous tick hit internal state
    /// corruption and [`ProximityEngine::reset`] has not been called.  The
    /// corrupting tick itself returns the underlying error and delivers
    /// nothing to sinks.
    pub fn tick(&mut self, samples: &[PoseSample]) -> Result<TickReport, ProxError> {
        if self.halted {
            return Err(ProxError::EngineHalted);
        }

        // Zone-set mutations only ever land here, so the rest of the tick
        // sees a stable registry.
        self.registry.apply_pending();
        self.states.sync(self.registry.zones());

        self.tick += 1;
        let tick = self.tick;
        let (snapshot, invalid_poses) = self.snapshots.ingest(tick, samples);
        let timestamp = Utc::now();

        let mut events = Vec::new();
        for zone in self.registry.zones() {
            let ZoneScore { score, contributor } = evaluate_zone(zone, &snapshot);
            let (previous, new) = match self.states.advance(zone, score) {
                Ok(levels) => levels,
                Err(cause) => {
                    error!(zone_id = %zone.id, %cause, "state store out of sync, halting engine");
                    self.halted = true;
                    return Err(cause);
                }
            };
            debug!(zone_id = %zone.id, score, level = %new, "zone evaluated");
            if previous != new {
                events.push(RiskEvent {
                    id: Uuid::new_v4(),
                    zone_id: zone.id.clone(),
                    previous_level: previous,
                    new_level: new,
                    tick,
                    timestamp,
                    contributor,
                });
            }
        }

        let sink_failures = self.dispatcher.dispatch(&events);

        Ok(TickReport {
            tick,
            events,
            sink_failures,
            invalid_poses,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Recovery
    // ─────────────────────────────────────────────────────────────────────

    /// True when the engine refuses ticks pending a [`ProximityEngine::reset`].
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Clear the halt flag, return every zone to `Safe`, and drop retained
    /// pose history.  Registered zones and subscribed sinks survive; the tick
    /// counter keeps counting so event ordering stays monotonic across the
    /// reset.
    pub fn reset(&mut self) {
        self.halted = false;
        self.states.reset();
        self.snapshots.clear();
    }
}
