//! Home directory layout of one environment

use bevy::log::info;
use std::path::{Path, PathBuf};

use crate::constants::{ENGINE_CONFIG_FILE, SAVES_DIR};

/// Resolves engine paths under a home directory.
///
/// Each environment owns its own manager; pointing one at a sandbox never
/// affects another.
#[derive(Debug, Clone)]
pub struct PathManager {
    home: PathBuf,
}

impl PathManager {
    pub fn new(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
        }
    }

    /// Redirect every path below a new home directory
    pub fn use_override_home_path(&mut self, home: &Path) {
        info!("Home path overridden to {}", home.display());
        self.home = home.to_path_buf();
    }

    pub fn home_path(&self) -> &Path {
        &self.home
    }

    pub fn saves_path(&self) -> PathBuf {
        self.home.join(SAVES_DIR)
    }

    /// Directory of the save called `name`
    pub fn save_path(&self, name: &str) -> PathBuf {
        self.saves_path().join(name)
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join(ENGINE_CONFIG_FILE)
    }
}
