//! [`EngineConfig`] – tick cadence and staleness window.
//!
//! The engine is embedded and frame-driven, so the only tunables are the
//! host's tick rate and how long a tracked entity may go without a valid
//! pose before it stops contributing to zone risk.  Hosts that persist the
//! configuration use TOML via [`load_from`] / [`save_to`]; `PROXGUARD_*`
//! environment variables override loaded values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Host update cadence in evaluations per second (typical VR: 90).
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: f32,

    /// Wall-clock window after which an entity with no valid pose is treated
    /// as removed.
    #[serde(default = "default_stale_timeout_ms")]
    pub stale_timeout_ms: u64,
}

fn default_tick_rate_hz() -> f32 {
    90.0
}
fn default_stale_timeout_ms() -> u64 {
    500
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate_hz(),
            stale_timeout_ms: default_stale_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// Staleness window expressed in ticks at the configured cadence,
    /// never below one tick.
    pub fn stale_timeout_ticks(&self) -> u64 {
        let ticks = (self.stale_timeout_ms as f32 / 1000.0) * self.tick_rate_hz;
        ticks.round().max(1.0) as u64
    }
}

/// Load a config from `path`.  Returns `None` when the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<EngineConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: EngineConfig =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Save `cfg` to `path`, creating parent directories if necessary.
pub fn save_to(cfg: &EngineConfig, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}

/// Apply `PROXGUARD_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `PROXGUARD_TICK_RATE_HZ` | `tick_rate_hz` |
/// | `PROXGUARD_STALE_TIMEOUT_MS` | `stale_timeout_ms` |
pub fn apply_env_overrides(cfg: &mut EngineConfig) {
    apply_overrides(
        cfg,
        std::env::var("PROXGUARD_TICK_RATE_HZ").ok().as_deref(),
        std::env::var("PROXGUARD_STALE_TIMEOUT_MS").ok().as_deref(),
    );
}

/// Apply override values to `cfg`.  Unparsable or out-of-range values are
/// ignored.  Extracted for testability without mutating environment
/// variables.
pub(crate) fn apply_overrides(
    cfg: &mut EngineConfig,
    tick_rate_hz: Option<&str>,
    stale_timeout_ms: Option<&str>,
) {
    if let Some(v) = tick_rate_hz
        && let Ok(hz) = v.parse::<f32>()
        && hz.is_finite()
        && hz > 0.0
    {
        cfg.tick_rate_hz = hz;
    }
    if let Some(v) = stale_timeout_ms
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.stale_timeout_ms = ms;
    }
}
