//! Module assets: urns, asset types and the per-environment asset index

pub mod manager;
pub mod urn;

pub use manager::{AssetEntry, AssetManager};
pub use urn::ResourceUrn;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kinds of asset a module can contribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Entity template, TOML
    Prefab,
    /// Block definition, TOML
    Block,
}

/// Asset index failures
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("malformed resource urn `{0}`")]
    InvalidUrn(String),

    #[error("asset type {0:?} is not registered")]
    UnregisteredType(AssetType),

    #[error("duplicate {asset_type:?} asset `{urn}`")]
    Duplicate { urn: String, asset_type: AssetType },

    #[error("more than {limit} {kind} ids")]
    IdsExhausted { kind: &'static str, limit: usize },

    #[error("malformed {asset_type:?} asset `{urn}`: {reason}")]
    Malformed {
        urn: String,
        asset_type: AssetType,
        reason: String,
    },
}
