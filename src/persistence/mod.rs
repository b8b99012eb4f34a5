//! World persistence

pub mod storage;

pub use storage::{GameManifest, ManifestModule, ReadWriteStorageManager, StorageManager};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest error: {0}")]
    Json(#[from] serde_json::Error),
}
