//! Catalog of modules available for loading
//!
//! Code modules are added directly. Data-only modules are read from a
//! directory laid out as:
//!
//! ```text
//! my-module/
//!   module.toml          # ModuleMetadata
//!   prefabs/*.prefab     # TOML prefab definitions
//!   blocks/*.block       # TOML block definitions
//! ```

use bevy::log::{info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::{AssetDefinition, Module, ModuleMetadata, ModuleName};
use crate::assets::AssetType;
use crate::constants::*;
use crate::error::EnvError;

/// Every module that can be resolved by name
#[derive(Debug, Default, Clone)]
pub struct ModuleRegistry {
    modules: HashMap<ModuleName, Arc<Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding just the built-in base module
    pub fn with_base_module() -> Result<Self, EnvError> {
        let mut registry = Self::new();
        registry.add(super::base::engine_module()?);
        Ok(registry)
    }

    /// Add a module, replacing any module with the same id
    pub fn add(&mut self, module: Module) {
        let id = module.id().clone();
        if let Some(previous) = self.modules.insert(id.clone(), Arc::new(module)) {
            warn!(
                "Module {} {} replaced by a newer registration",
                id,
                previous.version()
            );
        }
    }

    pub fn get(&self, name: &ModuleName) -> Option<&Arc<Module>> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &ModuleName) -> bool {
        self.modules.contains_key(name)
    }

    /// Sorted module ids
    pub fn names(&self) -> Vec<&ModuleName> {
        let mut names: Vec<_> = self.modules.keys().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Add every immediate subdirectory of `root` that has a module manifest
    pub fn scan_directory(&mut self, root: &Path) -> Result<usize, EnvError> {
        let entries = fs::read_dir(root).map_err(|e| {
            EnvError::module_load(root.display().to_string(), format!("cannot read module directory: {}", e))
        })?;

        let mut count = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && path.join(MODULE_MANIFEST_FILE).is_file() {
                self.add(load_module_directory(&path)?);
                count += 1;
            }
        }
        info!("Found {} data modules in {}", count, root.display());
        Ok(count)
    }
}

/// Read one data module from disk
pub fn load_module_directory(path: &Path) -> Result<Module, EnvError> {
    let name = path.display().to_string();
    let manifest_path = path.join(MODULE_MANIFEST_FILE);
    let content = fs::read_to_string(&manifest_path)
        .map_err(|e| EnvError::module_load(&name, format!("failed to read {}: {}", MODULE_MANIFEST_FILE, e)))?;
    let metadata: ModuleMetadata = toml::from_str(&content)
        .map_err(|e| EnvError::module_load(&name, format!("failed to parse {}: {}", MODULE_MANIFEST_FILE, e)))?;

    let module_id = metadata.id.to_string();
    let mut assets = read_assets(path, PREFAB_DIR, PREFAB_EXTENSION, AssetType::Prefab, &module_id)?;
    assets.extend(read_assets(path, BLOCK_DIR, BLOCK_EXTENSION, AssetType::Block, &module_id)?);

    info!(
        "Loaded data module {} {} ({} assets)",
        metadata.id,
        metadata.version,
        assets.len()
    );
    Ok(Module::from_parts(metadata, assets))
}

fn read_assets(
    module_path: &Path,
    dir: &str,
    extension: &str,
    asset_type: AssetType,
    module_id: &str,
) -> Result<Vec<AssetDefinition>, EnvError> {
    let asset_dir = module_path.join(dir);
    if !asset_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&asset_dir)
        .map_err(|e| EnvError::module_load(module_id, format!("cannot read {}: {}", dir, e)))?;

    let mut assets = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!("Skipping asset with non-UTF-8 name: {}", path.display());
            continue;
        };
        let source = fs::read_to_string(&path).map_err(|e| {
            EnvError::module_load(module_id, format!("failed to read {}: {}", path.display(), e))
        })?;
        assets.push(AssetDefinition {
            asset_type,
            name: stem.to_string(),
            source,
        });
    }
    // Directory order is platform dependent
    assets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_add_and_replace() {
        let mut registry = ModuleRegistry::new();
        registry.add(Module::builder("one", "1.0.0").build().unwrap());
        registry.add(Module::builder("One", "2.0.0").build().unwrap());

        assert_eq!(registry.len(), 1);
        let one = registry.get(&ModuleName::new("one").unwrap()).unwrap();
        assert_eq!(one.version().major, 2);
    }

    #[test]
    fn test_base_registry() {
        let registry = ModuleRegistry::with_base_module().unwrap();
        assert!(registry.contains(&ModuleName::new(BASE_MODULE).unwrap()));
    }

    #[test]
    fn test_scan_data_modules() {
        let dir = tempdir().unwrap();
        let module_dir = dir.path().join("furniture");
        fs::create_dir_all(module_dir.join(PREFAB_DIR)).unwrap();
        fs::create_dir_all(module_dir.join(BLOCK_DIR)).unwrap();
        fs::write(
            module_dir.join(MODULE_MANIFEST_FILE),
            "id = \"furniture\"\nversion = \"1.0.0\"\n\n[[dependencies]]\nid = \"engine\"\n",
        )
        .unwrap();
        fs::write(module_dir.join(PREFAB_DIR).join("table.prefab"), "").unwrap();
        fs::write(module_dir.join(PREFAB_DIR).join("notes.txt"), "ignored").unwrap();
        fs::write(module_dir.join(BLOCK_DIR).join("plank.block"), "hardness = 2").unwrap();
        // Directory without a manifest is skipped
        fs::create_dir_all(dir.path().join("not-a-module")).unwrap();

        let mut registry = ModuleRegistry::new();
        assert_eq!(registry.scan_directory(dir.path()).unwrap(), 1);

        let furniture = registry.get(&ModuleName::new("furniture").unwrap()).unwrap();
        assert_eq!(furniture.assets().len(), 2);
        assert_eq!(furniture.dependencies()[0].id.as_str(), "engine");
    }

    #[test]
    fn test_corrupt_manifest_fails() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(MODULE_MANIFEST_FILE), "id = [").unwrap();
        let err = load_module_directory(dir.path()).unwrap_err();
        assert!(matches!(err, EnvError::ModuleLoad { .. }));
    }
}
