use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

use super::*;
use crate::assets::AssetManager;
use crate::audio::AudioManager;
use crate::config::Config;
use crate::display::DisplayDevice;
use crate::entity::{
    ComponentLibrary, DamageEvent, EventLibrary, Health, PrefabManager,
};
use crate::error::EnvError;
use crate::game::Game;
use crate::headless::{HeadlessEnvironment, HeadlessModuleLoader, ModuleLoader};
use crate::loading::{LoadPrefabs, LoadProcess, LoadStage};
use crate::logging::init_test_logging;
use crate::module::{ModuleManager, ModuleRegistry, ModuleSet};
use crate::network::{NetworkError, NetworkMode, NetworkSystem};
use crate::persistence::StorageManager;
use crate::physics::CollisionGroupManager;
use crate::sandbox::{FileSystemFactory, Sandbox, TempDirFactory};
use crate::settings::HarnessSettings;
use crate::systems::engine::HealthSystem;
use crate::systems::{ComponentSystem, RegisterMode};
use crate::time::{MockTime, Time};
use crate::world::{
    BiomeManager, BlockManager, GeneratedWorldProvider, SimpleWorldProvider, WorldProvider,
};

fn builder() -> EnvironmentBuilder {
    init_test_logging();
    EnvironmentBuilder::new().with_settings(HarnessSettings::default())
}

fn is_empty_dir(path: &std::path::Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

#[test]
fn test_every_subsystem_registered() {
    let env = builder().build().unwrap();
    let context = env.context();

    assert!(context.contains::<AssetManager>());
    assert!(context.contains::<BlockManager>());
    assert!(context.contains::<BiomeManager>());
    assert!(context.contains::<Config>());
    assert!(context.contains::<dyn AudioManager>());
    assert!(context.contains::<CollisionGroupManager>());
    assert!(context.contains::<ModuleManager>());
    assert!(context.contains::<PathManager>());
    assert!(context.contains::<dyn Time>());
    assert!(context.contains::<dyn NetworkSystem>());
    assert!(context.contains::<Game>());
    assert!(context.contains::<ComponentLibrary>());
    assert!(context.contains::<EventLibrary>());
    assert!(context.contains::<PrefabManager>());
    assert!(context.contains::<EntityManager>());
    assert!(context.contains::<dyn WorldProvider>());
    assert!(context.contains::<dyn StorageManager>());
    assert!(context.contains::<dyn DisplayDevice>());
    assert!(context.contains::<ComponentSystemManager>());
    assert!(context.contains::<dyn Console>());
}

#[test]
fn test_default_dependencies_are_base_module() {
    let env = builder().build().unwrap();
    let modules = env.module_environment().unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules.names()[0].as_str(), "engine");
}

#[test]
fn test_prefabs_loaded_before_systems() {
    let env = builder().build().unwrap();
    let prefabs = env.context().get::<PrefabManager>().unwrap();
    assert_eq!(prefabs.stage(), LoadStage::Complete);
    assert!(prefabs.get("engine:character").is_some());
    assert!(prefabs.get("player").is_some());

    let systems = env.component_system_manager().unwrap();
    assert_eq!(systems.system_ids(), vec!["engine:health", "engine:world_info"]);
    assert!(!systems.contains("engine:camera"));
}

#[test]
fn test_headless_substitutions() {
    let env = builder().build().unwrap();
    let context = env.context();

    let network = context.get::<dyn NetworkSystem>().unwrap();
    assert_eq!(network.mode(), NetworkMode::None);
    assert_eq!(
        network.connect_client("bob"),
        Err(NetworkError::NotServer(NetworkMode::None))
    );

    assert!(context.get::<dyn DisplayDevice>().unwrap().is_headless());

    let time = context.get::<dyn Time>().unwrap();
    assert_eq!(time.game_time_ms(), 0);
    env.mock_time().advance(500);
    assert_eq!(time.game_time_ms(), 500);

    let storage = context.get::<dyn StorageManager>().unwrap();
    assert!(storage.save_path().starts_with(env.home_path()));
}

#[test]
fn test_world_is_deterministic() {
    let env = builder().build().unwrap();
    let console = env.console().unwrap();
    assert_eq!(console.execute("blockat 0 0 0").unwrap(), "engine:stone");
    assert_eq!(console.execute("blockat 7 -3 2").unwrap(), "engine:stone");
    assert_eq!(console.execute("blockat 0 1 0").unwrap(), "engine:air");

    let other = builder().build().unwrap();
    let world = other.context().get::<dyn WorldProvider>().unwrap();
    let blocks = other.context().get::<BlockManager>().unwrap();
    assert_eq!(world.seed(), HarnessSettings::default().world_seed);
    assert_eq!(
        world.get_block(bevy::math::IVec3::new(7, -3, 2)),
        blocks.block_id("engine:stone").unwrap()
    );
}

#[test]
fn test_console_lists_system_commands() {
    let env = builder().build().unwrap();
    let console = env.console().unwrap();
    let names = console.command_names();
    assert!(names.iter().any(|name| name == "blockat"));
    assert!(console.execute("help").unwrap().contains("blockat"));
}

#[test]
fn test_health_system_applies_damage() {
    let env = builder().build().unwrap();
    let entities = env.entity_manager().unwrap();
    let player = entities.create("engine:player").unwrap();

    let systems = env.component_system_manager().unwrap();
    let remaining = systems
        .with_system::<HealthSystem, _>(|health| {
            health.apply_damage(DamageEvent {
                target: player,
                amount: 30,
            })
        })
        .unwrap()
        .unwrap();
    assert_eq!(remaining, 70);
    assert_eq!(entities.get_component::<Health>(player).unwrap().current(), 70);
}

#[test]
fn test_save_world_into_sandbox() {
    let env = builder().build().unwrap();
    let entities = env.entity_manager().unwrap();
    entities.create("engine:character").unwrap();
    entities.create_empty();

    let game = env.context().get::<Game>().unwrap();
    game.start("test world", "seed");
    let storage = env.context().get::<dyn StorageManager>().unwrap();
    let manifest = storage.save_world(&game).unwrap();

    assert_eq!(manifest.entity_count, 2);
    assert_eq!(manifest.modules[0].id, "engine");
    assert!(manifest.block_mappings.contains_key("engine:stone"));
    assert_eq!(storage.load_manifest().unwrap(), Some(manifest));
}

#[test]
fn test_environments_are_isolated() {
    let mut first = builder().build().unwrap();
    let second = builder().build().unwrap();

    assert_ne!(first.id(), second.id());
    assert_ne!(first.home_path(), second.home_path());
    assert!(!Arc::ptr_eq(
        &first.entity_manager().unwrap(),
        &second.entity_manager().unwrap()
    ));

    let first_entities = first.entity_manager().unwrap();
    first_entities.create("engine:character").unwrap();
    assert_eq!(second.entity_manager().unwrap().entity_count(), 0);

    let first_home = first.home_path().to_path_buf();
    first.teardown();
    assert!(!first_home.exists());
    assert!(second.home_path().exists());

    // A handle kept from the torn down environment stays detached
    first_entities.create("engine:character").unwrap();

    let entities = second.entity_manager().unwrap();
    entities.create("engine:character").unwrap();
    entities.create("engine:player").unwrap();
    assert_eq!(entities.entity_count(), 2);
    assert_eq!(first_entities.entity_count(), 2);

    let game = second.context().get::<Game>().unwrap();
    let storage = second.context().get::<dyn StorageManager>().unwrap();
    let manifest = storage.save_world(&game).unwrap();
    assert_eq!(manifest.entity_count, 2);
    assert_eq!(storage.stored_entity_count().unwrap(), 2);
    assert!(storage.save_path().starts_with(second.home_path()));
}

#[test]
fn test_teardown_is_idempotent() {
    let mut env = builder().build().unwrap();
    let home = env.home_path().to_path_buf();
    let time = env.context().get::<dyn Time>().unwrap();
    assert!(home.exists());

    env.teardown();
    assert!(env.is_torn_down());
    assert!(env.context().is_empty());
    assert!(env.module_environment().is_none());
    assert!(!home.exists());

    env.teardown();
    drop(env);
    // Handles taken before teardown stay usable
    assert_eq!(time.game_time_ms(), 0);
}

#[test]
fn test_drop_removes_sandbox() {
    let parent = tempdir().unwrap();
    let env = builder()
        .with_file_system(TempDirFactory::in_dir(parent.path()))
        .build()
        .unwrap();
    assert!(env.home_path().starts_with(parent.path()));
    drop(env);
    assert!(is_empty_dir(parent.path()));
}

#[test]
fn test_missing_module_fails_setup() {
    let parent = tempdir().unwrap();
    let err = builder()
        .with_dependencies(["example"])
        .with_file_system(TempDirFactory::in_dir(parent.path()))
        .build()
        .unwrap_err();
    assert!(matches!(err, EnvError::ModuleLoad { ref module, .. } if module == "example"));
    assert!(is_empty_dir(parent.path()));
}

#[test]
fn test_invalid_module_name_fails_setup() {
    let err = builder().with_dependency("Not A Module").build().unwrap_err();
    assert!(matches!(err, EnvError::InvalidModuleName { .. }));
}

#[test]
fn test_added_module_is_loaded() {
    let module = Module::builder("example", "1.0.0")
        .depends_on("engine", "*")
        .with_prefab("crate", "persisted = false\n\n[components.location]\n")
        .build()
        .unwrap();
    let env = builder()
        .with_dependencies(["example"])
        .with_module(module)
        .build()
        .unwrap();

    assert_eq!(env.module_environment().unwrap().len(), 2);
    let prefabs = env.context().get::<PrefabManager>().unwrap();
    assert!(prefabs.get("example:crate").is_some());
}

struct Failing;

impl ComponentSystem for Failing {
    fn initialise(&mut self, _context: &crate::context::Context) -> anyhow::Result<()> {
        anyhow::bail!("broken on purpose")
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[test]
fn test_failing_system_tears_down_partial_environment() {
    let parent = tempdir().unwrap();
    let module = Module::builder("broken", "1.0.0")
        .depends_on("engine", "*")
        .with_system("failing", RegisterMode::Always, |_| Ok(Failing))
        .build()
        .unwrap();
    let err = builder()
        .with_dependencies(["broken"])
        .with_module(module)
        .with_file_system(TempDirFactory::in_dir(parent.path()))
        .build()
        .unwrap_err();

    assert!(matches!(err, EnvError::SystemLoad { ref system, .. } if system == "broken:failing"));
    assert!(is_empty_dir(parent.path()));
}

/// Loads normally, then drops the block manager
struct WithoutBlocks(HeadlessModuleLoader);

impl ModuleLoader for WithoutBlocks {
    fn load(&self, modules: &ModuleSet, paths: &PathManager) -> Result<HeadlessEnvironment> {
        let mut env = self.0.load(modules, paths)?;
        env.context_mut().remove::<BlockManager>();
        Ok(env)
    }
}

/// Counts sandboxes handed out
struct CountingFactory {
    inner: TempDirFactory,
    created: Arc<AtomicUsize>,
}

impl FileSystemFactory for CountingFactory {
    fn new_file_system(&self) -> std::io::Result<Sandbox> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.inner.new_file_system()
    }
}

#[test]
fn test_missing_baseline_subsystem_fails_setup() {
    let parent = tempdir().unwrap();
    let created = Arc::new(AtomicUsize::new(0));
    let err = builder()
        .with_module_loader(WithoutBlocks(HeadlessModuleLoader::with_base_module().unwrap()))
        .with_file_system(CountingFactory {
            inner: TempDirFactory::in_dir(parent.path()),
            created: created.clone(),
        })
        .build()
        .unwrap_err();

    assert!(err.missing_subsystem().unwrap().ends_with("BlockManager"));
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(is_empty_dir(parent.path()));
}

/// Headless context with substitutions but no prefab loading yet
fn substituted(home: &std::path::Path) -> crate::context::Context {
    let loader = HeadlessModuleLoader::new(ModuleRegistry::with_base_module().unwrap());
    let (mut context, modules) = loader
        .load(&ModuleSet::base(), &PathManager::new(home))
        .unwrap()
        .into_parts();
    let time = Arc::new(crate::time::MockTime::new());
    substitution::substitute_headless_subsystems(
        &mut context,
        &modules,
        &time,
        &HarnessSettings::default(),
    )
    .unwrap();
    context
}

#[test]
fn test_staged_prefab_loading() {
    let home = tempdir().unwrap();
    let context = substituted(home.path());
    let mut loader = LoadPrefabs::new(&context, 1).unwrap();

    assert!(matches!(
        loader.step(),
        Err(EnvError::InvalidLoaderState { operation: "step", .. })
    ));
    loader.begin().unwrap();
    assert!(matches!(
        loader.begin(),
        Err(EnvError::InvalidLoaderState { operation: "begin", .. })
    ));

    let mut steps = 1;
    while !loader.step().unwrap() {
        steps += 1;
    }
    assert_eq!(steps, 2);
    assert_eq!(loader.stage(), LoadStage::Complete);
    assert_eq!(loader.progress(), 1.0);
    assert_eq!(context.get::<PrefabManager>().unwrap().len(), 2);
}

#[test]
fn test_systems_need_loaded_prefabs() {
    let home = tempdir().unwrap();
    let context = substituted(home.path());
    let modules = context.get::<ModuleManager>().unwrap().environment().clone();

    let systems = ComponentSystemManager::new(&context).unwrap();
    let err = systems
        .load_systems(&modules, NetworkMode::DedicatedServer, &context)
        .unwrap_err();
    assert!(matches!(
        err,
        EnvError::InvalidLoaderState {
            operation: "load_systems",
            actual: LoadStage::NotStarted
        }
    ));
    assert!(systems.is_empty());
}

struct Fixture;

impl ModuleTestCase for Fixture {}

#[test]
fn test_module_test_case_defaults() {
    init_test_logging();
    let env = Fixture.setup_environment().unwrap();
    let names: HashSet<String> = env
        .module_environment()
        .unwrap()
        .names()
        .iter()
        .map(|name| name.as_str().to_string())
        .collect();
    assert_eq!(names, HashSet::from(["engine".to_string()]));
}

#[test]
fn test_substitution_replaces_baseline_instances() {
    let home = tempdir().unwrap();
    let loader = HeadlessModuleLoader::with_base_module().unwrap();
    let (mut context, modules) = loader
        .load(&ModuleSet::base(), &PathManager::new(home.path()))
        .unwrap()
        .into_parts();

    let time = context.get::<dyn Time>().unwrap();
    let network = context.get::<dyn NetworkSystem>().unwrap();
    let game = context.get::<Game>().unwrap();
    let components = context.get::<ComponentLibrary>().unwrap();
    let events = context.get::<EventLibrary>().unwrap();
    let prefabs = context.get::<PrefabManager>().unwrap();
    let entities = context.get::<EntityManager>().unwrap();
    let world = context.get::<dyn WorldProvider>().unwrap();
    assert!(world.as_any().downcast_ref::<GeneratedWorldProvider>().is_some());
    assert!(!context.contains::<dyn StorageManager>());
    assert!(!context.contains::<dyn DisplayDevice>());

    let mock_time = Arc::new(MockTime::new());
    substitution::substitute_headless_subsystems(
        &mut context,
        &modules,
        &mock_time,
        &HarnessSettings::default(),
    )
    .unwrap();

    let substituted_time = context.get::<dyn Time>().unwrap();
    assert!(!Arc::ptr_eq(&time, &substituted_time));
    assert_eq!(
        Arc::as_ptr(&substituted_time) as *const (),
        Arc::as_ptr(&mock_time) as *const ()
    );
    assert!(!Arc::ptr_eq(&network, &context.get::<dyn NetworkSystem>().unwrap()));
    assert!(!Arc::ptr_eq(&game, &context.get::<Game>().unwrap()));
    assert!(!Arc::ptr_eq(&components, &context.get::<ComponentLibrary>().unwrap()));
    assert!(!Arc::ptr_eq(&events, &context.get::<EventLibrary>().unwrap()));
    assert!(!Arc::ptr_eq(&prefabs, &context.get::<PrefabManager>().unwrap()));
    assert!(!Arc::ptr_eq(&entities, &context.get::<EntityManager>().unwrap()));

    let substituted_world = context.get::<dyn WorldProvider>().unwrap();
    assert!(!Arc::ptr_eq(&world, &substituted_world));
    assert!(substituted_world.as_any().downcast_ref::<SimpleWorldProvider>().is_some());

    assert!(context.contains::<dyn StorageManager>());
    assert!(context.get::<dyn DisplayDevice>().unwrap().is_headless());

    // Stale handles keep working, detached from the registry
    assert_eq!(network.mode(), NetworkMode::None);
    assert_eq!(entities.entity_count(), 0);
}

/// Checks on its peers from `initialise`
struct PeerCheck {
    saw_health: Arc<AtomicUsize>,
}

impl ComponentSystem for PeerCheck {
    fn initialise(&mut self, context: &crate::context::Context) -> anyhow::Result<()> {
        let systems = context.get::<ComponentSystemManager>()?;
        if systems.contains("engine:health") {
            self.saw_health.fetch_add(1, Ordering::SeqCst);
        }
        anyhow::ensure!(systems.with_system::<HealthSystem, _>(|_| ()).is_some());
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[test]
fn test_system_hooks_can_query_peers() {
    let saw_health = Arc::new(AtomicUsize::new(0));
    let counter = saw_health.clone();
    let module = Module::builder("peers", "1.0.0")
        .depends_on("engine", "*")
        .with_system("check", RegisterMode::Always, move |_| {
            Ok(PeerCheck {
                saw_health: counter.clone(),
            })
        })
        .build()
        .unwrap();
    let env = builder()
        .with_dependencies(["peers"])
        .with_module(module)
        .build()
        .unwrap();

    assert_eq!(saw_health.load(Ordering::SeqCst), 1);
    assert!(env.component_system_manager().unwrap().contains("peers:check"));
}
