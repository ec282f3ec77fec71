//! Session configuration.
//!
//! Everything has a default, so a config file only needs the fields it
//! changes:
//!
//! ```json
//! { "ticks": 1200, "tuning": { "jump_speed": 220.0 } }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use engine_physics::PhysicsConfig;
use serde::{Deserialize, Serialize};

/// Environment variable consulted for the RNG seed when none is configured.
pub const SEED_ENV: &str = "PLATFORMER_SEED";

/// Seed used when neither the config nor the environment provides one.
pub const DEFAULT_SEED: u64 = 0x7475_726e_6970;

/// Top-level configuration of one headless session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Level map to load. `None` uses the built-in meadow.
    pub level: Option<PathBuf>,
    /// Number of ticks to simulate.
    pub ticks: u64,
    /// Seconds per tick.
    pub timestep: f32,
    /// RNG seed; see [`SessionConfig::seed`].
    pub seed: Option<u64>,
    pub physics: PhysicsConfig,
    pub tuning: Tuning,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            level: None,
            ticks: 600,
            timestep: 1.0 / 60.0,
            seed: None,
            physics: PhysicsConfig::default(),
            tuning: Tuning::default(),
        }
    }
}

impl SessionConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// The configured seed, else `PLATFORMER_SEED`, else [`DEFAULT_SEED`].
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
            .or_else(|| std::env::var(SEED_ENV).ok()?.trim().parse().ok())
            .unwrap_or(DEFAULT_SEED)
    }
}

/// Gameplay constants. Speeds are in world units per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Downward acceleration, units/s².
    pub gravity: f32,
    pub walk_speed: f32,
    pub jump_speed: f32,
    pub throw_speed: f32,
    pub enemy_speed: f32,
    pub hop_speed: f32,
    /// Expected enemy hops per second while grounded.
    pub hop_rate: f32,
    /// Hunger gained per second; the player starves at 1.0.
    pub hunger_rate: f32,
    /// Hunger removed by one carrot.
    pub carrot_value: f32,
    /// Seconds for a plant to grow a pullable turnip, before jitter.
    pub plant_growth_time: f32,
    /// Seconds between enemy spawns, before jitter.
    pub spawn_interval: f32,
    /// Spawners stay idle while this many enemies are alive.
    pub max_enemies: usize,
    pub particle_count: u32,
    pub particle_lifetime: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 480.0,
            walk_speed: 60.0,
            jump_speed: 190.0,
            throw_speed: 160.0,
            enemy_speed: 24.0,
            hop_speed: 120.0,
            hop_rate: 0.4,
            hunger_rate: 0.02,
            carrot_value: 0.5,
            plant_growth_time: 4.0,
            spawn_interval: 6.0,
            max_enemies: 8,
            particle_count: 6,
            particle_lifetime: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: SessionConfig = serde_json::from_str(
            r#"{ "ticks": 30, "seed": 9, "tuning": { "jump_speed": 220.0 }, "physics": { "max_iterations": 3 } }"#,
        )
        .unwrap();
        assert_eq!(config.ticks, 30);
        assert_eq!(config.seed(), 9);
        assert_eq!(config.tuning.jump_speed, 220.0);
        assert_eq!(config.tuning.walk_speed, Tuning::default().walk_speed);
        assert_eq!(config.physics.max_iterations, 3);
        assert_eq!(config.physics.max_substep, 1.0);
        assert_eq!(config.level, None);
    }

    #[test]
    fn test_empty_object_is_default() {
        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = SessionConfig::load(Path::new("/nonexistent/session.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/session.json"));
    }
}
