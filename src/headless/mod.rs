//! Headless runtime bootstrap
//!
//! Loads a module set and populates a context with the baseline subsystems
//! a headless run has. Nothing here is test specific: the substitution layer
//! replaces the pieces a test needs to control.

use bevy::log::info;
use std::sync::Arc;

use crate::assets::{AssetError, AssetManager, AssetType};
use crate::audio::{AudioManager, NullAudioManager};
use crate::config::Config;
use crate::constants::BASE_MODULE;
use crate::context::Context;
use crate::entity::{add_entity_management_related_classes, add_reflection_based_libraries};
use crate::error::{EnvError, Result};
use crate::game::Game;
use crate::module::{ModuleEnvironment, ModuleManager, ModuleRegistry, ModuleSet};
use crate::network::{NetworkSystem, NetworkSystemImpl};
use crate::paths::PathManager;
use crate::physics::CollisionGroupManager;
use crate::time::{EngineTime, Time};
use crate::world::{BiomeManager, BlockId, BlockManager, GeneratedWorldProvider, WorldProvider};

/// A loaded module environment and the context of its subsystems
pub struct HeadlessEnvironment {
    context: Context,
    environment: Arc<ModuleEnvironment>,
}

impl HeadlessEnvironment {
    pub fn new(context: Context, environment: Arc<ModuleEnvironment>) -> Self {
        Self {
            context,
            environment,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn module_environment(&self) -> &Arc<ModuleEnvironment> {
        &self.environment
    }

    pub fn into_parts(self) -> (Context, Arc<ModuleEnvironment>) {
        (self.context, self.environment)
    }
}

/// Module-loading service the environment is built through
pub trait ModuleLoader: Send + Sync {
    fn load(&self, modules: &ModuleSet, paths: &PathManager) -> Result<HeadlessEnvironment>;
}

/// Asset failures are reported against the module that owns the asset
fn asset_load_error(fallback: &str, error: AssetError) -> EnvError {
    let module = match &error {
        AssetError::Duplicate { urn, .. } | AssetError::Malformed { urn, .. } => {
            urn.split(':').next().unwrap_or(fallback).to_string()
        }
        _ => fallback.to_string(),
    };
    EnvError::module_load(module, error.to_string())
}

/// Loads modules from a catalog and wires the baseline subsystems
#[derive(Debug, Clone)]
pub struct HeadlessModuleLoader {
    registry: ModuleRegistry,
}

impl HeadlessModuleLoader {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Loader whose catalog is just the base module
    pub fn with_base_module() -> Result<Self> {
        Ok(Self::new(ModuleRegistry::with_base_module()?))
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }
}

impl ModuleLoader for HeadlessModuleLoader {
    fn load(&self, modules: &ModuleSet, paths: &PathManager) -> Result<HeadlessEnvironment> {
        let mut context = Context::new();
        context.put_value(Config::load(&paths.config_path()));
        context.put_value(paths.clone());

        let mut module_manager = ModuleManager::new(self.registry.clone());
        let environment = module_manager.load_environment(modules)?;

        let mut assets = AssetManager::new();
        assets.register_asset_type(AssetType::Prefab);
        assets.register_asset_type(AssetType::Block);
        for module in environment.modules() {
            assets
                .index_module(module)
                .map_err(|e| asset_load_error(module.id().as_str(), e))?;
        }
        let blocks = BlockManager::from_assets(&assets).map_err(|e| asset_load_error(BASE_MODULE, e))?;
        let collision_groups = CollisionGroupManager::from_environment(&environment)
            .map_err(|e| EnvError::module_load(BASE_MODULE, e.to_string()))?;

        let ground = |urn: &str| blocks.block_id(urn).unwrap_or(BlockId::AIR);
        let world: Arc<dyn WorldProvider> = Arc::new(GeneratedWorldProvider::random(
            ground("engine:grass"),
            ground("engine:stone"),
        ));

        context.put_value(assets);
        context.put_value(blocks);
        context.put_value(
            BiomeManager::from_environment(&environment).map_err(|e| asset_load_error(BASE_MODULE, e))?,
        );
        context.put_value(collision_groups);
        context.put::<dyn AudioManager>(Arc::new(NullAudioManager::new()));

        let time: Arc<dyn Time> = Arc::new(EngineTime::new());
        context.put(time.clone());
        let network: Arc<dyn NetworkSystem> = Arc::new(NetworkSystemImpl::new(time, &context));
        context.put(network);
        context.put_value(Game::new());
        context.put(world);

        add_reflection_based_libraries(&mut context, &environment);
        add_entity_management_related_classes(&mut context)?;

        context.put_value(module_manager);
        info!(
            "Headless environment ready: {} modules, {} subsystems",
            environment.len(),
            context.len()
        );
        Ok(HeadlessEnvironment::new(context, environment))
    }
}
