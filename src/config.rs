//! Engine configuration subsystem
//!
//! Loaded from `config.toml` in the (sandboxed) home directory. A missing or
//! unreadable file yields defaults; the harness writes the effective config
//! back into the sandbox at teardown.

use bevy::log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine configuration as modules see it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub system: SystemConfig,
    pub network: NetworkConfig,
    pub world_generation: WorldGenerationConfig,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Worker threads a subsystem may spawn (headless runs use 1)
    pub max_threads: usize,
    /// Day length in game-time milliseconds
    pub day_night_length_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_threads: 1,
            day_night_length_ms: 1_800_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Clients a server accepts before refusing connections
    pub max_clients: usize,
    pub server_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_clients: 8,
            server_port: 25777,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGenerationConfig {
    pub world_title: String,
    /// Empty = pick at random
    pub default_seed: String,
}

impl Default for WorldGenerationConfig {
    fn default() -> Self {
        Self {
            world_title: "New World".to_string(),
            default_seed: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub name: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: "Player".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or return defaults if the file is missing or invalid
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No {} found, using default config", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
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

    /// Write to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }
}
