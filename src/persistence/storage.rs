//! Read/write storage manager
//!
//! A save directory holds `world.db` (sqlite, WAL mode) with the persisted
//! entities and `manifest.json` describing the game and the module set it
//! was saved with.

use bevy::log::{debug, info};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::StorageError;
use crate::constants::{GAME_MANIFEST_FILE, WORLD_DATABASE_FILE};
use crate::entity::EntityManager;
use crate::game::{Game, GameInfo};
use crate::module::ModuleEnvironment;
use crate::world::{BiomeManager, BlockManager};

/// Module id and version a save was made with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestModule {
    pub id: String,
    pub version: String,
}

/// Description of a save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameManifest {
    pub game: GameInfo,
    pub saved_at: DateTime<Utc>,
    pub modules: Vec<ManifestModule>,
    pub block_mappings: BTreeMap<String, u16>,
    pub biomes: BTreeMap<String, u16>,
    pub entity_count: usize,
}

/// Persistence capability
pub trait StorageManager: Send + Sync {
    fn save_path(&self) -> &Path;

    /// Persist entities and write the manifest
    fn save_world(&self, game: &Game) -> Result<GameManifest, StorageError>;

    /// Manifest of the last save, if there is one
    fn load_manifest(&self) -> Result<Option<GameManifest>, StorageError>;

    /// Entities currently stored
    fn stored_entity_count(&self) -> Result<usize, StorageError>;
}

pub struct ReadWriteStorageManager {
    save_path: PathBuf,
    conn: Mutex<Connection>,
    environment: Arc<ModuleEnvironment>,
    entities: Arc<EntityManager>,
    blocks: Arc<BlockManager>,
    biomes: Arc<BiomeManager>,
}

impl ReadWriteStorageManager {
    /// Open (or create) the save at `save_path`
    pub fn new(
        save_path: &Path,
        environment: Arc<ModuleEnvironment>,
        entities: Arc<EntityManager>,
        blocks: Arc<BlockManager>,
        biomes: Arc<BiomeManager>,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(save_path)?;
        let conn = Connection::open(save_path.join(WORLD_DATABASE_FILE))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                id INTEGER PRIMARY KEY,
                prefab TEXT,
                saved_at TEXT NOT NULL
            );
            "#,
        )?;
        debug!("Opened save at {}", save_path.display());

        Ok(Self {
            save_path: save_path.to_path_buf(),
            conn: Mutex::new(conn),
            environment,
            entities,
            blocks,
            biomes,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn manifest_path(&self) -> PathBuf {
        self.save_path.join(GAME_MANIFEST_FILE)
    }

    /// Entities whose prefab (if any) is persisted
    fn persisted_entities(&self) -> Vec<(u64, Option<String>)> {
        let prefabs = self.entities.prefab_manager();
        self.entities
            .entities()
            .into_iter()
            .filter(|(_, prefab)| match prefab {
                Some(urn) => prefabs
                    .get(&urn.to_string())
                    .map(|prefab| prefab.persisted)
                    .unwrap_or(true),
                None => true,
            })
            .map(|(entity, prefab)| (entity.to_bits(), prefab.map(|urn| urn.to_string())))
            .collect()
    }
}

impl StorageManager for ReadWriteStorageManager {
    fn save_path(&self) -> &Path {
        &self.save_path
    }

    fn save_world(&self, game: &Game) -> Result<GameManifest, StorageError> {
        let saved_at = Utc::now();
        let entities = self.persisted_entities();

        {
            let mut conn = self.lock();
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM entities", [])?;
            {
                let mut insert =
                    tx.prepare("INSERT INTO entities (id, prefab, saved_at) VALUES (?1, ?2, ?3)")?;
                for (id, prefab) in &entities {
                    insert.execute(params![*id as i64, prefab, saved_at.to_rfc3339()])?;
                }
            }
            tx.commit()?;
        }

        let manifest = GameManifest {
            game: game.info(),
            saved_at,
            modules: self
                .environment
                .modules()
                .iter()
                .map(|module| ManifestModule {
                    id: module.id().to_string(),
                    version: module.version().to_string(),
                })
                .collect(),
            block_mappings: self.blocks.mappings(),
            biomes: self
                .biomes
                .biomes()
                .map(|(urn, id)| (urn.to_string(), id.0))
                .collect(),
            entity_count: entities.len(),
        };
        fs::write(self.manifest_path(), serde_json::to_string_pretty(&manifest)?)?;
        info!(
            "Saved {} entities to {}",
            manifest.entity_count,
            self.save_path.display()
        );
        Ok(manifest)
    }

    fn load_manifest(&self) -> Result<Option<GameManifest>, StorageError> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn stored_entity_count(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
