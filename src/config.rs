//! Engine tuning configuration.
//!
//! Every knob has a default; deployments may override any subset from a TOML
//! file (`engine.toml` in the data directory, by convention).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Per-state success thresholds for the SRS scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SrsConfig {
    /// Combined successes needed to leave NEW
    pub new_to_learning: u32,
    /// Combined successes needed to reach KNOWN
    pub learning_to_known: u32,
    /// Combined successes needed to reach MASTERED
    pub known_to_mastered: u32,
    /// Production successes that promote KNOWN straight to MASTERED
    pub production_to_mastered: u32,
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            new_to_learning: 2,
            learning_to_known: 5,
            known_to_mastered: 9,
            production_to_mastered: 4,
        }
    }
}

/// Engine-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Daily XP goal assigned to new profiles
    pub daily_goal_xp: i64,
    /// Streak freezes granted to new profiles
    pub initial_streak_freezes: u32,
    pub srs: SrsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            daily_goal_xp: 50,
            initial_streak_freezes: 2,
            srs: SrsConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// anything the file doesn't mention
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
