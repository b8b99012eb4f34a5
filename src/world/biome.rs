//! Biome registry

use std::collections::BTreeMap;

use crate::assets::{AssetError, ResourceUrn};
use crate::module::ModuleEnvironment;

/// Short id persisted with chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BiomeId(pub u16);

/// Biomes that the loaded modules declare, with stable short ids
#[derive(Debug, Default)]
pub struct BiomeManager {
    biomes: BTreeMap<ResourceUrn, BiomeId>,
}

impl BiomeManager {
    /// Fails when the modules declare more biomes than short ids allow
    pub fn from_environment(environment: &ModuleEnvironment) -> Result<Self, AssetError> {
        let mut urns: Vec<ResourceUrn> = environment
            .modules()
            .iter()
            .flat_map(|module| {
                module
                    .biomes()
                    .iter()
                    .filter_map(move |name| ResourceUrn::new(module.id(), name).ok())
            })
            .collect();
        urns.sort();
        urns.dedup();

        let biomes = urns
            .into_iter()
            .enumerate()
            .map(|(index, urn)| Ok((urn, BiomeId(super::short_id("biome", index)?))))
            .collect::<Result<_, AssetError>>()?;
        Ok(Self { biomes })
    }

    pub fn biome_id(&self, urn: &str) -> Option<BiomeId> {
        ResourceUrn::parse(urn)
            .ok()
            .and_then(|urn| self.biomes.get(&urn).copied())
    }

    pub fn biomes(&self) -> impl Iterator<Item = (&ResourceUrn, BiomeId)> {
        self.biomes.iter().map(|(urn, id)| (urn, *id))
    }

    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }
}
