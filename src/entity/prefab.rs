//! Prefabs: entity templates
//!
//! A prefab source is TOML:
//!
//! ```toml
//! parent = "engine:character"   # optional
//! persisted = true              # optional, default true
//!
//! [components.health]
//! max = 50
//! ```
//!
//! Component keys are resolved against the component library when the
//! prefab is loaded. A child copies its parent's components and replaces
//! them per component, never per field.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::ComponentLibrary;
use crate::assets::ResourceUrn;
use crate::loading::LoadStage;
use crate::module::ModuleName;

/// Prefab as written in an asset
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrefabSource {
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default = "persisted_by_default")]
    pub persisted: bool,
    #[serde(default)]
    pub components: BTreeMap<String, toml::Value>,
}

fn persisted_by_default() -> bool {
    true
}

impl PrefabSource {
    pub fn parse(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

/// A loaded prefab with inherited components applied
#[derive(Debug, Clone, PartialEq)]
pub struct Prefab {
    pub urn: ResourceUrn,
    pub parent: Option<ResourceUrn>,
    pub persisted: bool,
    /// Component urn -> serialized value
    pub components: BTreeMap<ResourceUrn, toml::Value>,
}

impl Prefab {
    /// Resolve `source` against the library and merge in `parent`
    pub fn build(
        urn: ResourceUrn,
        source: PrefabSource,
        parent: Option<&Prefab>,
        library: &ComponentLibrary,
    ) -> Result<Self, String> {
        let module = ModuleName::new(urn.module()).map_err(|e| e.to_string())?;
        let mut components = parent
            .map(|parent| parent.components.clone())
            .unwrap_or_default();

        for (key, value) in source.components {
            let metadata = library
                .resolve(&key, Some(&module))
                .ok_or_else(|| format!("unknown component `{}`", key))?;
            components.insert(metadata.urn.clone(), value);
        }

        Ok(Self {
            urn,
            parent: parent.map(|parent| parent.urn.clone()),
            persisted: source.persisted,
            components,
        })
    }

    pub fn has_component(&self, urn: &str) -> bool {
        ResourceUrn::parse(urn)
            .map(|urn| self.components.contains_key(&urn))
            .unwrap_or(false)
    }
}

/// Loaded prefabs of one environment
#[derive(Debug, Default)]
pub struct PrefabManager {
    prefabs: RwLock<BTreeMap<ResourceUrn, Arc<Prefab>>>,
    stage: RwLock<LoadStage>,
}

impl PrefabManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, prefab: Prefab) -> Arc<Prefab> {
        let prefab = Arc::new(prefab);
        if let Ok(mut prefabs) = self.prefabs.write() {
            prefabs.insert(prefab.urn.clone(), prefab.clone());
        }
        prefab
    }

    /// Look up by urn, or by bare name when exactly one module provides it
    pub fn get(&self, name: &str) -> Option<Arc<Prefab>> {
        let prefabs = self.prefabs.read().ok()?;
        if ResourceUrn::is_qualified(name) {
            let urn = ResourceUrn::parse(name).ok()?;
            return prefabs.get(&urn).cloned();
        }
        let wanted = name.to_ascii_lowercase();
        let mut matches = prefabs.values().filter(|prefab| prefab.urn.resource() == wanted);
        match (matches.next(), matches.next()) {
            (Some(prefab), None) => Some(prefab.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, urn: &ResourceUrn) -> bool {
        self.prefabs
            .read()
            .map(|prefabs| prefabs.contains_key(urn))
            .unwrap_or(false)
    }

    pub fn urns(&self) -> Vec<ResourceUrn> {
        self.prefabs
            .read()
            .map(|prefabs| prefabs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.prefabs.read().map(|prefabs| prefabs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stage of the prefab load process feeding this manager
    pub fn stage(&self) -> LoadStage {
        self.stage.read().map(|stage| *stage).unwrap_or_default()
    }

    pub fn set_stage(&self, stage: LoadStage) {
        if let Ok(mut current) = self.stage.write() {
            *current = stage;
        }
    }
}
