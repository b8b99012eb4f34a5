//! Block registry
//!
//! Block definitions come from `Block` assets. Ids are assigned at
//! construction: air is always 0, every other block follows in urn order, so
//! the same module set always produces the same mapping.

use bevy::log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::assets::{AssetError, AssetManager, AssetType, ResourceUrn};
use crate::constants::AIR_BLOCK;

/// Numeric block id as stored in chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: BlockId = BlockId(0);
}

/// Block definition as written in a `.block` asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockDefinition {
    pub display_name: String,
    pub hardness: u32,
    pub penetrable: bool,
    pub liquid: bool,
}

impl Default for BlockDefinition {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            hardness: 3,
            penetrable: false,
            liquid: false,
        }
    }
}

/// A registered block
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub urn: ResourceUrn,
    pub definition: BlockDefinition,
}

/// Block types known to one environment
#[derive(Debug)]
pub struct BlockManager {
    blocks: Vec<Block>,
    by_urn: BTreeMap<ResourceUrn, BlockId>,
}

impl BlockManager {
    /// Parse every indexed block asset and assign ids
    pub fn from_assets(assets: &AssetManager) -> Result<Self, AssetError> {
        let air_urn = ResourceUrn::parse(AIR_BLOCK)?;
        let mut manager = Self {
            blocks: Vec::new(),
            by_urn: BTreeMap::new(),
        };
        manager.push(
            air_urn.clone(),
            BlockDefinition {
                display_name: "Air".to_string(),
                hardness: 0,
                penetrable: true,
                liquid: false,
            },
        )?;

        for urn in assets.available_assets(AssetType::Block)? {
            if urn == air_urn {
                continue;
            }
            let Some(entry) = assets.get(AssetType::Block, &urn) else {
                continue;
            };
            let definition: BlockDefinition =
                toml::from_str(&entry.source).map_err(|e| AssetError::Malformed {
                    urn: urn.to_string(),
                    asset_type: AssetType::Block,
                    reason: e.to_string(),
                })?;
            debug!("Block {} -> {}", urn, manager.blocks.len());
            manager.push(urn, definition)?;
        }

        info!("Registered {} block types", manager.blocks.len());
        Ok(manager)
    }

    fn push(&mut self, urn: ResourceUrn, definition: BlockDefinition) -> Result<(), AssetError> {
        let id = BlockId(super::short_id("block", self.blocks.len())?);
        self.by_urn.insert(urn.clone(), id);
        self.blocks.push(Block {
            id,
            urn,
            definition,
        });
        Ok(())
    }

    pub fn block_id(&self, urn: &str) -> Option<BlockId> {
        ResourceUrn::parse(urn)
            .ok()
            .and_then(|urn| self.by_urn.get(&urn).copied())
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0 as usize)
    }

    pub fn block_by_urn(&self, urn: &str) -> Option<&Block> {
        self.block_id(urn).and_then(|id| self.block(id))
    }

    /// urn -> id mapping, as persisted with a save
    pub fn mappings(&self) -> BTreeMap<String, u16> {
        self.by_urn
            .iter()
            .map(|(urn, id)| (urn.to_string(), id.0))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
