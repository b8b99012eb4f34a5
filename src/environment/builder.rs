//! Environment builder

use bevy::log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use super::ModuleTestingEnvironment;
use super::substitution::substitute_headless_subsystems;
use crate::assets::AssetManager;
use crate::audio::AudioManager;
use crate::config::Config;
use crate::console::{Console, ConsoleImpl};
use crate::constants::BASE_MODULE;
use crate::context::Context;
use crate::error::{EnvError, Result};
use crate::headless::{HeadlessModuleLoader, ModuleLoader};
use crate::loading::{LoadPrefabs, run_to_completion};
use crate::module::{Module, ModuleEnvironment, ModuleManager, ModuleRegistry, ModuleSet};
use crate::network::NetworkMode;
use crate::paths::PathManager;
use crate::physics::CollisionGroupManager;
use crate::sandbox::{FileSystemFactory, TempDirFactory};
use crate::settings::HarnessSettings;
use crate::systems::ComponentSystemManager;
use crate::world::BlockManager;

/// Configures and builds a [`ModuleTestingEnvironment`]
pub struct EnvironmentBuilder {
    dependencies: Vec<String>,
    modules: Vec<Module>,
    module_dirs: Vec<PathBuf>,
    settings: HarnessSettings,
    file_system: Box<dyn FileSystemFactory>,
    loader: Option<Box<dyn ModuleLoader>>,
}

impl EnvironmentBuilder {
    /// Builder loading only `engine`, with settings from the settings file
    pub fn new() -> Self {
        Self {
            dependencies: vec![BASE_MODULE.to_string()],
            modules: Vec::new(),
            module_dirs: Vec::new(),
            settings: HarnessSettings::load(),
            file_system: Box::new(TempDirFactory::new()),
            loader: None,
        }
    }

    /// Replace the module names to load (the base module is always added)
    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = names.into_iter().map(Into::into).collect();
        self
    }

    /// Add one module name to load
    pub fn with_dependency(mut self, name: &str) -> Self {
        self.dependencies.push(name.to_string());
        self
    }

    /// Make a code module available for resolution
    pub fn with_module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    /// Make the data modules under `path` available for resolution
    pub fn with_module_directory(mut self, path: &Path) -> Self {
        self.module_dirs.push(path.to_path_buf());
        self
    }

    pub fn with_settings(mut self, settings: HarnessSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use another source of sandboxed home directories
    pub fn with_file_system<F: FileSystemFactory + 'static>(mut self, factory: F) -> Self {
        self.file_system = Box::new(factory);
        self
    }

    /// Use another module loader. Catalog additions (`with_module`,
    /// `with_module_directory`) are ignored by custom loaders.
    pub fn with_module_loader<L: ModuleLoader + 'static>(mut self, loader: L) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    fn default_loader(modules: Vec<Module>, module_dirs: &[PathBuf]) -> Result<Box<dyn ModuleLoader>> {
        let mut registry = ModuleRegistry::with_base_module()?;
        for module in modules {
            registry.add(module);
        }
        for dir in module_dirs {
            registry.scan_directory(dir)?;
        }
        Ok(Box::new(HeadlessModuleLoader::new(registry)))
    }

    /// Run every setup stage. On failure the partial environment is torn
    /// down before the error is returned.
    pub fn build(self) -> Result<ModuleTestingEnvironment> {
        let id = Uuid::new_v4();
        info!("Setting up module testing environment {}", id);

        let sandbox = self
            .file_system
            .new_file_system()
            .map_err(EnvError::SandboxInit)?;
        let mut environment = ModuleTestingEnvironment::new(id, sandbox);

        match self.wire(&mut environment) {
            Ok(()) => {
                info!("Module testing environment {} ready", id);
                Ok(environment)
            }
            Err(e) => {
                environment.teardown();
                Err(e)
            }
        }
    }

    fn wire(self, environment: &mut ModuleTestingEnvironment) -> Result<()> {
        let mut paths = PathManager::new(Path::new("."));
        paths.use_override_home_path(&environment.home);

        let modules = ModuleSet::from_names(&self.dependencies)?;
        let loader = match self.loader {
            Some(loader) => loader,
            None => Self::default_loader(self.modules, &self.module_dirs)?,
        };
        let (mut context, module_environment) = loader.load(&modules, &paths)?.into_parts();
        environment.module_environment = Some(module_environment.clone());

        context.get::<AssetManager>()?;
        context.get::<BlockManager>()?;
        context.get::<Config>()?;
        context.get::<dyn AudioManager>()?;
        context.get::<CollisionGroupManager>()?;
        context.get::<ModuleManager>()?;

        let result = Self::wire_context(&mut context, &module_environment, environment, &self.settings);
        // Whatever was wired is handed over so teardown can reach it
        environment.context = context;
        result
    }

    fn wire_context(
        context: &mut Context,
        module_environment: &Arc<ModuleEnvironment>,
        environment: &ModuleTestingEnvironment,
        settings: &HarnessSettings,
    ) -> Result<()> {
        substitute_headless_subsystems(context, module_environment, &environment.mock_time, settings)?;

        let mut prefabs = LoadPrefabs::new(context, settings.prefabs_per_step)?;
        run_to_completion(&mut prefabs)?;

        let systems = Arc::new(ComponentSystemManager::new(context)?);
        context.put(systems.clone());
        systems.load_systems(module_environment, NetworkMode::DedicatedServer, context)?;
        systems.initialise(context)?;

        context.put::<dyn Console>(Arc::new(ConsoleImpl::new(context)));
        Ok(())
    }
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
