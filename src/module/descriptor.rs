//! Module descriptors and the builder code modules are declared with

use bevy::prelude::Component;
use semver::{Version, VersionReq};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ModuleName;
use crate::assets::AssetType;
use crate::context::Context;
use crate::entity::{ComponentRegistration, EventRegistration};
use crate::error::EnvError;
use crate::systems::{ComponentSystem, RegisterMode, SystemDeclaration};

/// Declared dependency on another module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyInfo {
    pub id: ModuleName,
    /// Accepted versions of the dependency (default: any)
    #[serde(default = "any_version")]
    pub version: VersionReq,
    /// Optional dependencies only order loading; they are never pulled in
    #[serde(default)]
    pub optional: bool,
}

fn any_version() -> VersionReq {
    VersionReq::STAR
}

/// Identity and dependency information of a module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub id: ModuleName,
    pub version: Version,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<DependencyInfo>,
    /// Biomes the module adds, as bare names
    #[serde(default)]
    pub biomes: Vec<String>,
    /// Collision groups the module adds, as bare names
    #[serde(default)]
    pub collision_groups: Vec<String>,
}

/// Asset source contributed by a module
#[derive(Debug, Clone)]
pub struct AssetDefinition {
    pub asset_type: AssetType,
    /// Bare resource name; the module id is prefixed when indexed
    pub name: String,
    pub source: String,
}

/// A loadable unit of content and logic
pub struct Module {
    metadata: ModuleMetadata,
    assets: Vec<AssetDefinition>,
    components: Vec<ComponentRegistration>,
    events: Vec<EventRegistration>,
    systems: Vec<SystemDeclaration>,
}

impl Module {
    /// Start declaring a module
    pub fn builder(id: &str, version: &str) -> ModuleBuilder {
        ModuleBuilder::new(id, version)
    }

    /// Module with no code, built from metadata and asset sources
    pub fn from_parts(metadata: ModuleMetadata, assets: Vec<AssetDefinition>) -> Self {
        Self {
            metadata,
            assets,
            components: Vec::new(),
            events: Vec::new(),
            systems: Vec::new(),
        }
    }

    pub fn id(&self) -> &ModuleName {
        &self.metadata.id
    }

    pub fn version(&self) -> &Version {
        &self.metadata.version
    }

    pub fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    pub fn dependencies(&self) -> &[DependencyInfo] {
        &self.metadata.dependencies
    }

    pub fn assets(&self) -> &[AssetDefinition] {
        &self.assets
    }

    pub fn components(&self) -> &[ComponentRegistration] {
        &self.components
    }

    pub fn events(&self) -> &[EventRegistration] {
        &self.events
    }

    pub fn systems(&self) -> &[SystemDeclaration] {
        &self.systems
    }

    pub fn biomes(&self) -> &[String] {
        &self.metadata.biomes
    }

    pub fn collision_groups(&self) -> &[String] {
        &self.metadata.collision_groups
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.metadata.id)
            .field("version", &self.metadata.version.to_string())
            .field("assets", &self.assets.len())
            .field("components", &self.components.len())
            .field("systems", &self.systems.len())
            .finish()
    }
}

/// Builder for code modules.
///
/// Validation is deferred to [`ModuleBuilder::build`] so declarations read as
/// one chain.
pub struct ModuleBuilder {
    id: String,
    version: String,
    display_name: String,
    description: String,
    dependencies: Vec<(String, String, bool)>,
    biomes: Vec<String>,
    collision_groups: Vec<String>,
    assets: Vec<AssetDefinition>,
    components: Vec<ComponentRegistration>,
    events: Vec<EventRegistration>,
    systems: Vec<SystemDeclaration>,
}

impl ModuleBuilder {
    fn new(id: &str, version: &str) -> Self {
        Self {
            id: id.to_string(),
            version: version.to_string(),
            display_name: String::new(),
            description: String::new(),
            dependencies: Vec::new(),
            biomes: Vec::new(),
            collision_groups: Vec::new(),
            assets: Vec::new(),
            components: Vec::new(),
            events: Vec::new(),
            systems: Vec::new(),
        }
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Require another module; `version` is a semver requirement such as `^1.2`
    pub fn depends_on(mut self, id: &str, version: &str) -> Self {
        self.dependencies
            .push((id.to_string(), version.to_string(), false));
        self
    }

    /// Load after another module if something else pulls it in
    pub fn optionally_depends_on(mut self, id: &str, version: &str) -> Self {
        self.dependencies
            .push((id.to_string(), version.to_string(), true));
        self
    }

    /// Register a component type under `name` so prefabs can use it
    pub fn with_component<C>(mut self, name: &str) -> Self
    where
        C: Component + DeserializeOwned,
    {
        self.components.push(ComponentRegistration::of::<C>(name));
        self
    }

    /// Register an event type under `name`
    pub fn with_event<E: Send + Sync + 'static>(mut self, name: &str) -> Self {
        self.events.push(EventRegistration::of::<E>(name));
        self
    }

    pub fn with_asset(mut self, asset_type: AssetType, name: &str, source: &str) -> Self {
        self.assets.push(AssetDefinition {
            asset_type,
            name: name.to_string(),
            source: source.to_string(),
        });
        self
    }

    /// Add a prefab; `source` is the TOML prefab definition
    pub fn with_prefab(self, name: &str, source: &str) -> Self {
        self.with_asset(AssetType::Prefab, name, source)
    }

    /// Add a block; `source` is the TOML block definition
    pub fn with_block(self, name: &str, source: &str) -> Self {
        self.with_asset(AssetType::Block, name, source)
    }

    pub fn with_biome(mut self, name: &str) -> Self {
        self.biomes.push(name.to_string());
        self
    }

    pub fn with_collision_group(mut self, name: &str) -> Self {
        self.collision_groups.push(name.to_string());
        self
    }

    /// Declare a component system constructed by `factory` when eligible
    pub fn with_system<S, F>(mut self, name: &str, mode: RegisterMode, factory: F) -> Self
    where
        S: ComponentSystem + 'static,
        F: Fn(&Context) -> anyhow::Result<S> + Send + Sync + 'static,
    {
        self.systems.push(SystemDeclaration {
            name: name.to_string(),
            mode,
            factory: Arc::new(move |context: &Context| {
                factory(context).map(|system| Box::new(system) as Box<dyn ComponentSystem>)
            }),
        });
        self
    }

    /// Validate the declaration
    pub fn build(self) -> Result<Module, EnvError> {
        let id = ModuleName::new(&self.id)?;
        let version = Version::parse(&self.version)
            .map_err(|e| EnvError::module_load(&self.id, format!("invalid version `{}`: {}", self.version, e)))?;

        let mut dependencies = Vec::with_capacity(self.dependencies.len());
        for (dep_id, dep_version, optional) in self.dependencies {
            let dep_name = ModuleName::new(&dep_id)?;
            let requirement = VersionReq::parse(&dep_version).map_err(|e| {
                EnvError::module_load(
                    &self.id,
                    format!("invalid version requirement `{}` for `{}`: {}", dep_version, dep_id, e),
                )
            })?;
            dependencies.push(DependencyInfo {
                id: dep_name,
                version: requirement,
                optional,
            });
        }

        Ok(Module {
            metadata: ModuleMetadata {
                id,
                version,
                display_name: self.display_name,
                description: self.description,
                dependencies,
                biomes: self.biomes,
                collision_groups: self.collision_groups,
            },
            assets: self.assets,
            components: self.components,
            events: self.events,
            systems: self.systems,
        })
    }
}
