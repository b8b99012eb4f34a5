//! Module testing environment
//!
//! Builds a fully wired headless runtime for one test:
//!
//! 1. fresh sandboxed home directory
//! 2. module set loaded through the module loader (baseline subsystems)
//! 3. headless substitutions
//! 4. prefab loading driven to completion
//! 5. component systems loaded for a dedicated server and initialised
//! 6. console registered
//!
//! Teardown shuts the systems down, drops the registry and removes the
//! sandbox. It runs at most once, also from `Drop`.

pub mod builder;
pub mod slot;
pub mod substitution;

#[cfg(test)]
mod tests;

pub use builder::EnvironmentBuilder;
pub use slot::EnvironmentSlot;

use bevy::log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::console::Console;
use crate::constants::BASE_MODULE;
use crate::context::Context;
use crate::entity::EntityManager;
use crate::error::Result;
use crate::module::{Module, ModuleEnvironment};
use crate::network::NetworkSystem;
use crate::paths::PathManager;
use crate::sandbox::Sandbox;
use crate::systems::ComponentSystemManager;
use crate::time::MockTime;

/// A headless runtime owned by one test (or one test group, see
/// [`EnvironmentSlot`])
pub struct ModuleTestingEnvironment {
    id: Uuid,
    context: Context,
    module_environment: Option<Arc<ModuleEnvironment>>,
    sandbox: Option<Sandbox>,
    home: PathBuf,
    mock_time: Arc<MockTime>,
    torn_down: bool,
}

impl ModuleTestingEnvironment {
    /// Builder with the default dependency set (`engine`)
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    /// Default environment: base module only
    pub fn setup() -> Result<Self> {
        EnvironmentBuilder::new().build()
    }

    fn new(id: Uuid, sandbox: Sandbox) -> Self {
        Self {
            id,
            context: Context::new(),
            module_environment: None,
            home: sandbox.root().to_path_buf(),
            sandbox: Some(sandbox),
            mock_time: Arc::new(MockTime::new()),
            torn_down: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Registry of every wired subsystem. Empty after teardown.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn entity_manager(&self) -> Result<Arc<EntityManager>> {
        Ok(self.context.get::<EntityManager>()?)
    }

    pub fn console(&self) -> Result<Arc<dyn Console>> {
        Ok(self.context.get::<dyn Console>()?)
    }

    pub fn component_system_manager(&self) -> Result<Arc<ComponentSystemManager>> {
        Ok(self.context.get::<ComponentSystemManager>()?)
    }

    /// Clock every subsystem reads; advance it to move game time
    pub fn mock_time(&self) -> &Arc<MockTime> {
        &self.mock_time
    }

    /// Sandboxed home directory (removed at teardown)
    pub fn home_path(&self) -> &Path {
        &self.home
    }

    pub fn module_environment(&self) -> Option<&Arc<ModuleEnvironment>> {
        self.module_environment.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Release everything the environment owns. Never panics; runs once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        info!("Tearing down module testing environment {}", self.id);

        if let Ok(systems) = self.context.get::<ComponentSystemManager>() {
            systems.shutdown();
        }
        if let Ok(network) = self.context.get::<dyn NetworkSystem>() {
            network.shutdown();
        }
        if let (Ok(config), Ok(paths)) = (self.context.get::<Config>(), self.context.get::<PathManager>())
            && let Err(e) = config.save(&paths.config_path())
        {
            warn!("Failed to save config at teardown: {}", e);
        }

        self.context = Context::new();
        self.module_environment = None;
        if let Some(mut sandbox) = self.sandbox.take() {
            sandbox.close();
        }
    }
}

impl Drop for ModuleTestingEnvironment {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for ModuleTestingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleTestingEnvironment")
            .field("id", &self.id)
            .field("home", &self.home)
            .field("torn_down", &self.torn_down)
            .field("context", &self.context)
            .finish()
    }
}

/// Test fixture hooks.
///
/// Override `dependencies` to choose the loaded module set and `modules` to
/// add modules to the catalog it is resolved from.
pub trait ModuleTestCase {
    fn dependencies(&self) -> Vec<String> {
        vec![BASE_MODULE.to_string()]
    }

    fn modules(&self) -> Result<Vec<Module>> {
        Ok(Vec::new())
    }

    fn setup_environment(&self) -> Result<ModuleTestingEnvironment> {
        let mut builder = EnvironmentBuilder::new().with_dependencies(self.dependencies());
        for module in self.modules()? {
            builder = builder.with_module(module);
        }
        builder.build()
    }
}
