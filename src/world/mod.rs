//! Blocks, biomes and the world providers built on them

pub mod biome;
pub mod block;
pub mod provider;

pub use biome::{BiomeId, BiomeManager};
pub use block::{Block, BlockDefinition, BlockId, BlockManager};
pub use provider::{GeneratedWorldProvider, SimpleWorldProvider, WorldProvider};

use crate::assets::AssetError;

/// Short id for the `index`th entry of a registry
fn short_id(kind: &'static str, index: usize) -> Result<u16, AssetError> {
    u16::try_from(index).map_err(|_| AssetError::IdsExhausted {
        kind,
        limit: usize::from(u16::MAX) + 1,
    })
}
