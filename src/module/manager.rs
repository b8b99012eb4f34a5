//! Module manager subsystem

use bevy::log::info;
use std::sync::Arc;

use super::{ModuleEnvironment, ModuleName, ModuleRegistry, ModuleSet, resolver};
use crate::error::EnvError;

/// Owns the module catalog and the currently loaded environment
#[derive(Debug)]
pub struct ModuleManager {
    registry: ModuleRegistry,
    environment: Arc<ModuleEnvironment>,
}

impl ModuleManager {
    /// Manager with nothing loaded yet
    pub fn new(registry: ModuleRegistry) -> Self {
        Self {
            registry,
            environment: Arc::new(ModuleEnvironment::default()),
        }
    }

    /// Resolve and activate a module set, replacing the current environment
    pub fn load_environment(&mut self, modules: &ModuleSet) -> Result<Arc<ModuleEnvironment>, EnvError> {
        let environment = Arc::new(resolver::resolve(&self.registry, modules)?);
        info!(
            "Loaded module environment: {}",
            environment
                .names()
                .iter()
                .map(|name| name.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.environment = environment.clone();
        Ok(environment)
    }

    pub fn environment(&self) -> &Arc<ModuleEnvironment> {
        &self.environment
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn is_loaded(&self, name: &ModuleName) -> bool {
        self.environment.contains(name)
    }
}
