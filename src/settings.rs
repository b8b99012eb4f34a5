//! Harness settings
//!
//! Knobs of the test environment itself (not of the engine under test),
//! read from `config/testing_environment.toml` when present.

use bevy::log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::*;

/// Path to the settings file, relative to the working directory
pub const SETTINGS_FILE: &str = "config/testing_environment.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessSettings {
    /// Save slot the storage manager writes to
    pub save_name: String,
    /// Prefabs the loader processes per step
    pub prefabs_per_step: usize,
    /// Seed of the in-memory world
    pub world_seed: u64,
    /// Block the in-memory world is made of
    pub ground_block: String,
    /// Highest solid y coordinate
    pub ground_level: i32,
    /// Filter used by `init_test_logging` when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            save_name: DEFAULT_SAVE_NAME.to_string(),
            prefabs_per_step: DEFAULT_PREFABS_PER_STEP,
            world_seed: DEFAULT_WORLD_SEED,
            ground_block: DEFAULT_GROUND_BLOCK.to_string(),
            ground_level: DEFAULT_GROUND_LEVEL,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl HarnessSettings {
    /// Load from [`SETTINGS_FILE`], or defaults
    pub fn load() -> Self {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    /// Load from `path`, or return defaults if the file is missing or invalid
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded harness settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
