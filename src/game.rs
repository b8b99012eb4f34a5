//! Game session record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

/// Descriptive state of the running game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: Uuid,
    pub title: String,
    pub seed: String,
    pub started_at: DateTime<Utc>,
}

/// The current game session.
///
/// A fresh session holds no title or seed until [`Game::start`] is called.
#[derive(Debug)]
pub struct Game {
    id: Uuid,
    started_at: DateTime<Utc>,
    state: RwLock<Option<(String, String)>>,
}

impl Game {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            state: RwLock::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn start(&self, title: &str, seed: &str) {
        if let Ok(mut state) = self.state.write() {
            *state = Some((title.to_string(), seed.to_string()));
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.read().map(|state| state.is_some()).unwrap_or(false)
    }

    /// Snapshot for persistence; empty title and seed before `start`
    pub fn info(&self) -> GameInfo {
        let (title, seed) = self
            .state
            .read()
            .ok()
            .and_then(|state| state.clone())
            .unwrap_or_default();
        GameInfo {
            id: self.id,
            title,
            seed,
            started_at: self.started_at,
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
