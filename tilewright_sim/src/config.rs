// Data-driven simulation configuration.
//
// All tunable parameters live in `SimConfig`, loaded from JSON at startup or
// built from `Default`. The sim reads every cost, range, and threshold from
// here rather than hard-coding it: pathfinding tile costs, the poison counter
// range, throw distance, and autopilot scheduling knobs.
//
// Parameters are grouped into small nested structs (`PathingCosts`,
// `PoisonParams`, `AutopilotParams`) so related knobs travel together and a
// JSON file stays readable.
//
// See also: `world.rs` which owns the `SimConfig`, `pathfinding.rs` for the
// cost grid that reads `PathingCosts`, `interpreter.rs` for the autopilot
// knobs.
//
// **Critical constraint: determinism.** Config values feed straight into
// simulation logic. Two worlds with the same seed and config evolve
// identically.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Traversal costs for the per-query pathfinding grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathingCosts {
    /// Cost of entering an unobstructed tile.
    pub base_tile_cost: u32,
    /// Cost of entering a tile whose only obstruction is a closed passage
    /// that can be opened. Discourages, but permits, routing through doors.
    pub closed_passage_cost: u32,
    /// Extra cost added when another agent stands on the tile.
    pub occupied_tile_penalty: u32,
}

/// Poison counter roll applied when an agent eats something poisonous.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoisonParams {
    /// Inclusive lower bound of the rolled counter, in ticks.
    pub min_ticks: u32,
    /// Inclusive upper bound of the rolled counter, in ticks.
    pub max_ticks: u32,
}

/// Knobs for the autopilot scheduler and interpreter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutopilotParams {
    /// An agent is busy while any queued action has priority strictly above
    /// this value.
    pub busy_priority_threshold: u32,
    /// Sub-actions pushed by a decomposing goal get the parent's priority
    /// plus this boost, so they run before the parent resumes.
    pub subtask_priority_boost: u32,
    /// Number of forward steps after opening a door at which the agent turns
    /// around to close it.
    pub door_close_after_steps: u32,
    /// Per-step chance that a wandering agent picks a new heading even when
    /// its current one is clear.
    pub wander_turn_chance: f64,
    /// Consecutive ticks a navigating agent waits behind another agent
    /// before giving up on the goal.
    #[serde(default = "default_max_blocked_wait_ticks")]
    pub max_blocked_wait_ticks: u32,
}

fn default_max_blocked_wait_ticks() -> u32 {
    5
}

/// Top-level simulation configuration. Never mutated after the world is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Grid dimensions in tiles (width, height).
    pub grid_size: (u32, u32),
    pub pathing: PathingCosts,
    pub poison: PoisonParams,
    /// How far (in tiles) a thrown object can travel.
    pub throw_distance: u32,
    pub autopilot: AutopilotParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size: (32, 32),
            pathing: PathingCosts {
                base_tile_cost: 1,
                closed_passage_cost: 20,
                occupied_tile_penalty: 10,
            },
            poison: PoisonParams {
                min_ticks: 20,
                max_ticks: 60,
            },
            throw_distance: 3,
            autopilot: AutopilotParams {
                busy_priority_threshold: 1,
                subtask_priority_boost: 1,
                door_close_after_steps: 1,
                wander_turn_chance: 0.25,
                max_blocked_wait_ticks: default_max_blocked_wait_ticks(),
            },
        }
    }
}

impl SimConfig {
    /// Parse and validate a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject configs the sim cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (w, h) = self.grid_size;
        if w == 0 || h == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid_size must be non-zero, got {w}x{h}"
            )));
        }
        if w > i32::MAX as u32 || h > i32::MAX as u32 {
            return Err(ConfigError::Invalid("grid_size exceeds i32 range".into()));
        }
        let p = &self.pathing;
        if p.base_tile_cost == 0 || p.closed_passage_cost == 0 {
            return Err(ConfigError::Invalid(
                "pathing costs must be at least 1".into(),
            ));
        }
        if self.autopilot.subtask_priority_boost == 0 {
            return Err(ConfigError::Invalid(
                "autopilot.subtask_priority_boost must be at least 1".into(),
            ));
        }
        if self.poison.min_ticks > self.poison.max_ticks {
            return Err(ConfigError::Invalid(format!(
                "poison.min_ticks ({}) exceeds poison.max_ticks ({})",
                self.poison.min_ticks, self.poison.max_ticks
            )));
        }
        let chance = self.autopilot.wander_turn_chance;
        if !(0.0..=1.0).contains(&chance) {
            return Err(ConfigError::Invalid(format!(
                "autopilot.wander_turn_chance must be within [0, 1], got {chance}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn default_config_survives_json() {
        let config = SimConfig::default();
        let json = config.to_json_pretty().unwrap();
        let restored = SimConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn config_loads_from_json_string() {
        let json = r#"{
            "grid_size": [12, 8],
            "pathing": {
                "base_tile_cost": 2,
                "closed_passage_cost": 30,
                "occupied_tile_penalty": 5
            },
            "poison": { "min_ticks": 3, "max_ticks": 9 },
            "throw_distance": 4,
            "autopilot": {
                "busy_priority_threshold": 2,
                "subtask_priority_boost": 3,
                "door_close_after_steps": 1,
                "wander_turn_chance": 0.5
            }
        }"#;
        let config = SimConfig::from_json(json).unwrap();
        assert_eq!(config.grid_size, (12, 8));
        assert_eq!(config.pathing.closed_passage_cost, 30);
        assert_eq!(config.poison.max_ticks, 9);
        assert_eq!(config.autopilot.subtask_priority_boost, 3);
        // Omitted fields fall back to their defaults.
        assert_eq!(config.autopilot.max_blocked_wait_ticks, 5);
    }

    #[test]
    fn rejects_inverted_poison_range() {
        let mut config = SimConfig::default();
        config.poison.min_ticks = 10;
        config.poison.max_ticks = 2;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_subtask_boost() {
        let mut config = SimConfig::default();
        config.autopilot.subtask_priority_boost = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_empty_grid() {
        let mut config = SimConfig::default();
        config.grid_size = (0, 10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            SimConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SimConfig::load("/definitely/not/here/tilewright.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
