//! Engine configuration with documented knobs
//!
//! Configuration covers pipeline behaviour only. Game-balance values live in
//! `constants.rs` and are never configurable: changing them would break
//! parity with the reference simulation.

use serde::Deserialize;

use crate::core::error::{EngineError, Result};

/// Configuration for the tick pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// How many ticks an NPC creep may reuse a cached path before it must
    /// re-derive one from current positions.
    ///
    /// Larger values make NPC movement cheaper but slower to react to
    /// hostiles repositioning. The reference uses short-lived caches.
    pub npc_path_cache_ticks: u64,

    /// Whether to accumulate the cosmetic event log.
    ///
    /// The event log is best-effort telemetry for client visualization and
    /// has no gameplay effect; headless batch runs can switch it off.
    pub event_log: bool,

    /// Minimum room count before the multi-room driver parallelizes.
    ///
    /// Below this threshold rayon's fork/join overhead exceeds the benefit.
    /// A single room tick is always strictly sequential regardless.
    pub parallel_room_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            npc_path_cache_ticks: 5,
            event_log: true,
            parallel_room_threshold: 4,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.npc_path_cache_ticks == 0 {
            return Err(EngineError::Config(
                "npc_path_cache_ticks must be at least 1".into(),
            ));
        }
        if self.parallel_room_threshold == 0 {
            return Err(EngineError::Config(
                "parallel_room_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Load from a TOML file; missing keys fall back to defaults
    pub fn load_from_toml(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig =
            toml::from_str(&text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
