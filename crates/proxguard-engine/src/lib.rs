//! `proxguard-engine` – Proximity Risk Engine
//!
//! Frame-driven hazard-proximity evaluation for VR/XR safety training.  The
//! host samples tracked poses once per frame and feeds them to
//! [`ProximityEngine::tick`][engine::ProximityEngine::tick]; the engine scores
//! every registered zone, advances a hysteresis-stabilised risk-level state
//! machine, and delivers level transitions to subscriber sinks.
//!
//! # Modules
//!
//! - [`registry`] – [`ZoneRegistry`][registry::ZoneRegistry]: insertion-ordered
//!   zone set; mutations are buffered and applied atomically at tick
//!   boundaries so every tick sees a stable zone set.
//! - [`snapshot`] – [`SnapshotBuilder`][snapshot::SnapshotBuilder]: validates
//!   raw pose samples, retains a last-known-good pose per entity across brief
//!   tracking loss, and evicts entities after the staleness window.
//! - [`evaluator`] – pure proximity scoring: `clamp(1 − d/radius, 0, 1)`,
//!   reduced per zone via maximum (worst case governs).
//! - [`state`] – [`RiskStateStore`][state::RiskStateStore]: per-zone
//!   `Safe → Warning → Critical` state machine with hysteresis on the way
//!   down, at most one level step per tick.
//! - [`dispatch`] – [`EventDispatcher`][dispatch::EventDispatcher]: ordered
//!   synchronous fan-out of [`RiskEvent`][proxguard_types::RiskEvent]s to
//!   every subscribed [`RiskSink`][dispatch::RiskSink]; sink failures are
//!   collected, never silently dropped.
//! - [`engine`] – [`ProximityEngine`][engine::ProximityEngine]: the single
//!   per-frame entry point tying the pipeline together.
//! - [`config`] – [`EngineConfig`][config::EngineConfig]: tick cadence and
//!   staleness window, with TOML persistence and `PROXGUARD_*` environment
//!   overrides.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod evaluator;
pub mod registry;
pub mod snapshot;
pub mod state;

pub use config::EngineConfig;
pub use dispatch::{EventDispatcher, RiskSink, SinkFailure, TracingSink};
pub use engine::{ProximityEngine, TickReport};
pub use evaluator::{ZoneScore, evaluate_zone, proximity_score};
pub use registry::ZoneRegistry;
pub use snapshot::{EntitySnapshot, SnapshotBuilder, SnapshotEntity};
pub use state::RiskStateStore;
