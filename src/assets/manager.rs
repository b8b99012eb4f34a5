//! Asset index over the loaded module set

use bevy::log::{debug, info};
use std::collections::{BTreeMap, HashSet};

use super::{AssetError, AssetType, ResourceUrn};
use crate::module::{Module, ModuleName};

/// One indexed asset
#[derive(Debug, Clone)]
pub struct AssetEntry {
    pub urn: ResourceUrn,
    pub asset_type: AssetType,
    pub module: ModuleName,
    pub source: String,
}

/// Index of every asset contributed by the loaded modules.
///
/// Assets are keyed per type, so a prefab and a block may share an urn.
#[derive(Debug, Default)]
pub struct AssetManager {
    registered_types: HashSet<AssetType>,
    assets: BTreeMap<(AssetType, ResourceUrn), AssetEntry>,
}

impl AssetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an asset type loadable. Listing an unregistered type fails.
    pub fn register_asset_type(&mut self, asset_type: AssetType) {
        self.registered_types.insert(asset_type);
    }

    pub fn is_registered(&self, asset_type: AssetType) -> bool {
        self.registered_types.contains(&asset_type)
    }

    /// Index every asset a module declares
    pub fn index_module(&mut self, module: &Module) -> Result<(), AssetError> {
        let module_name = module.id();
        for asset in module.assets() {
            let urn = ResourceUrn::new(module_name, &asset.name)?;
            let key = (asset.asset_type, urn.clone());
            if self.assets.contains_key(&key) {
                return Err(AssetError::Duplicate {
                    urn: urn.to_string(),
                    asset_type: asset.asset_type,
                });
            }
            debug!("Indexed {:?} {}", asset.asset_type, urn);
            self.assets.insert(
                key,
                AssetEntry {
                    urn,
                    asset_type: asset.asset_type,
                    module: module_name.clone(),
                    source: asset.source.clone(),
                },
            );
        }
        info!(
            "Indexed {} assets from module {}",
            module.assets().len(),
            module_name
        );
        Ok(())
    }

    /// All urns of a type, sorted
    pub fn available_assets(&self, asset_type: AssetType) -> Result<Vec<ResourceUrn>, AssetError> {
        if !self.is_registered(asset_type) {
            return Err(AssetError::UnregisteredType(asset_type));
        }
        Ok(self
            .assets
            .keys()
            .filter(|(ty, _)| *ty == asset_type)
            .map(|(_, urn)| urn.clone())
            .collect())
    }

    pub fn get(&self, asset_type: AssetType, urn: &ResourceUrn) -> Option<&AssetEntry> {
        self.assets.get(&(asset_type, urn.clone()))
    }

    /// Resolve a possibly unqualified name.
    ///
    /// Qualified names are parsed as-is. A bare name prefers the context
    /// module, then any single module providing it. Ambiguous bare names do
    /// not resolve.
    pub fn resolve(
        &self,
        asset_type: AssetType,
        name: &str,
        context: Option<&ModuleName>,
    ) -> Option<ResourceUrn> {
        if ResourceUrn::is_qualified(name) {
            return ResourceUrn::parse(name).ok();
        }

        if let Some(module) = context
            && let Ok(urn) = ResourceUrn::new(module, name)
            && self.get(asset_type, &urn).is_some()
        {
            return Some(urn);
        }

        let wanted = name.to_ascii_lowercase();
        let mut matches = self
            .assets
            .keys()
            .filter(|(ty, urn)| *ty == asset_type && urn.resource() == wanted)
            .map(|(_, urn)| urn);
        match (matches.next(), matches.next()) {
            (Some(urn), None) => Some(urn.clone()),
            _ => None,
        }
    }

    /// Number of indexed assets of a type
    pub fn count(&self, asset_type: AssetType) -> usize {
        self.assets.keys().filter(|(ty, _)| *ty == asset_type).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str) -> Module {
        Module::builder(name, "1.0.0").build().unwrap()
    }

    #[test]
    fn test_index_and_list() {
        let core = Module::builder("core", "1.0.0")
            .with_prefab("player", "")
            .with_prefab("chest", "")
            .with_block("stone", "")
            .build()
            .unwrap();

        let mut assets = AssetManager::new();
        assets.register_asset_type(AssetType::Prefab);
        assets.index_module(&core).unwrap();

        let prefabs = assets.available_assets(AssetType::Prefab).unwrap();
        let names: Vec<_> = prefabs.iter().map(|u| u.to_string()).collect();
        assert_eq!(names, vec!["core:chest", "core:player"]);
        assert_eq!(assets.count(AssetType::Block), 1);
    }

    #[test]
    fn test_unregistered_type_cannot_be_listed() {
        let assets = AssetManager::new();
        let err = assets.available_assets(AssetType::Prefab).unwrap_err();
        assert!(matches!(err, AssetError::UnregisteredType(AssetType::Prefab)));
    }

    #[test]
    fn test_duplicate_asset_is_rejected() {
        let broken = Module::builder("broken", "1.0.0")
            .with_prefab("thing", "")
            .with_prefab("Thing", "")
            .build()
            .unwrap();
        let mut assets = AssetManager::new();
        assert!(matches!(
            assets.index_module(&broken),
            Err(AssetError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_resolve_bare_names() {
        let a = Module::builder("a", "1.0.0")
            .with_prefab("door", "")
            .with_prefab("shared", "")
            .build()
            .unwrap();
        let b = Module::builder("b", "1.0.0")
            .with_prefab("shared", "")
            .build()
            .unwrap();
        let mut assets = AssetManager::new();
        assets.index_module(&a).unwrap();
        assets.index_module(&b).unwrap();
        assets.index_module(&module("c")).unwrap();

        let a_name = ModuleName::new("a").unwrap();
        let b_name = ModuleName::new("b").unwrap();

        assert_eq!(
            assets.resolve(AssetType::Prefab, "door", None).unwrap().to_string(),
            "a:door"
        );
        assert!(assets.resolve(AssetType::Prefab, "shared", None).is_none());
        assert_eq!(
            assets
                .resolve(AssetType::Prefab, "shared", Some(&b_name))
                .unwrap()
                .to_string(),
            "b:shared"
        );
        assert_eq!(
            assets
                .resolve(AssetType::Prefab, "door", Some(&b_name))
                .unwrap()
                .to_string(),
            "a:door"
        );
        assert!(assets.resolve(AssetType::Prefab, "door", Some(&a_name)).is_some());
    }
}
