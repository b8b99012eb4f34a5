//! Component system lifecycle

use bevy::log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use super::ComponentSystem;
use crate::console::ConsoleCommand;
use crate::context::Context;
use crate::entity::PrefabManager;
use crate::error::{EnvError, Result};
use crate::loading::LoadStage;
use crate::module::ModuleEnvironment;
use crate::network::NetworkMode;

struct LoadedSystem {
    /// `module:name`
    id: String,
    system: Mutex<Box<dyn ComponentSystem>>,
}

impl LoadedSystem {
    fn lock(&self) -> MutexGuard<'_, Box<dyn ComponentSystem>> {
        self.system.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn hook_error(id: &str, hook: &str, source: anyhow::Error) -> EnvError {
    EnvError::SystemLoad {
        system: id.to_string(),
        source: source.context(format!("{} hook failed", hook)),
    }
}

/// Loads, initialises and shuts down the component systems of one
/// environment.
///
/// The system list lock is only held to copy the list, so hooks may query
/// the manager they are registered with.
pub struct ComponentSystemManager {
    prefabs: Arc<PrefabManager>,
    systems: Mutex<Vec<Arc<LoadedSystem>>>,
}

impl ComponentSystemManager {
    pub fn new(context: &Context) -> Result<Self> {
        Ok(Self {
            prefabs: context.get::<PrefabManager>()?,
            systems: Mutex::new(Vec::new()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<LoadedSystem>>> {
        self.systems.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn snapshot(&self) -> Vec<Arc<LoadedSystem>> {
        self.lock().clone()
    }

    /// Construct every system eligible for `mode`, in module load order.
    ///
    /// Prefab loading must be complete: systems may look prefabs up in their
    /// constructors.
    pub fn load_systems(&self, environment: &ModuleEnvironment, mode: NetworkMode, context: &Context) -> Result<usize> {
        let stage = self.prefabs.stage();
        if stage != LoadStage::Complete {
            return Err(EnvError::InvalidLoaderState {
                operation: "load_systems",
                actual: stage,
            });
        }

        let mut loaded = Vec::new();
        for module in environment.modules() {
            for declaration in module.systems() {
                let id = format!("{}:{}", module.id().normalised(), declaration.name);
                if !declaration.mode.is_valid_for(mode) {
                    debug!("Skipping {} ({:?}) in {:?}", id, declaration.mode, mode);
                    continue;
                }
                let system = (declaration.factory)(context).map_err(|source| EnvError::SystemLoad {
                    system: id.clone(),
                    source,
                })?;
                debug!("Loaded system {}", id);
                loaded.push(Arc::new(LoadedSystem {
                    id,
                    system: Mutex::new(system),
                }));
            }
        }

        let count = loaded.len();
        self.lock().extend(loaded);
        info!("Loaded {} component systems for {:?}", count, mode);
        Ok(count)
    }

    /// Run `initialise`, then `pre_begin`, then `post_begin` on every system
    pub fn initialise(&self, context: &Context) -> Result<()> {
        let systems = self.snapshot();
        for loaded in &systems {
            loaded
                .lock()
                .initialise(context)
                .map_err(|e| hook_error(&loaded.id, "initialise", e))?;
        }
        for loaded in &systems {
            loaded
                .lock()
                .pre_begin()
                .map_err(|e| hook_error(&loaded.id, "pre_begin", e))?;
        }
        for loaded in &systems {
            loaded
                .lock()
                .post_begin()
                .map_err(|e| hook_error(&loaded.id, "post_begin", e))?;
        }
        Ok(())
    }

    /// Shut systems down in reverse order and drop them. Errors are logged.
    pub fn shutdown(&self) {
        let systems = std::mem::take(&mut *self.lock());
        for loaded in systems.into_iter().rev() {
            if let Err(e) = loaded.lock().shutdown() {
                warn!("Component system {} failed to shut down: {:#}", loaded.id, e);
            }
        }
    }

    /// Ids of loaded systems in registration order
    pub fn system_ids(&self) -> Vec<String> {
        self.lock().iter().map(|loaded| loaded.id.clone()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().iter().any(|loaded| loaded.id == id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Commands of every loaded system
    pub fn commands(&self) -> Vec<ConsoleCommand> {
        self.snapshot()
            .iter()
            .flat_map(|loaded| loaded.lock().commands())
            .collect()
    }

    /// Run `f` on the first loaded system of type `S`.
    ///
    /// A system that is busy in one of its own hooks is skipped.
    pub fn with_system<S, R>(&self, f: impl FnOnce(&S) -> R) -> Option<R>
    where
        S: ComponentSystem + 'static,
    {
        for loaded in self.snapshot() {
            let system = match loaded.system.try_lock() {
                Ok(system) => system,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => continue,
            };
            if let Some(found) = system.as_any().downcast_ref::<S>() {
                return Some(f(found));
            }
        }
        None
    }
}

impl std::fmt::Debug for ComponentSystemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSystemManager")
            .field("systems", &self.system_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;
    use crate::systems::RegisterMode;
    use std::any::Any;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_initialise: bool,
    }

    impl ComponentSystem for Recorder {
        fn initialise(&mut self, _context: &Context) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("init {}", self.name));
            if self.fail_initialise {
                anyhow::bail!("cannot start {}", self.name);
            }
            Ok(())
        }

        fn post_begin(&mut self) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("post {}", self.name));
            Ok(())
        }

        fn shutdown(&mut self) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("shutdown {}", self.name));
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn setup(log: &Arc<Mutex<Vec<String>>>, fail: bool) -> (Context, ModuleEnvironment) {
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        let module = Module::builder("test", "1.0.0")
            .with_system("first", RegisterMode::Always, move |_| {
                Ok(Recorder { name: "first", log: a.clone(), fail_initialise: false })
            })
            .with_system("client_only", RegisterMode::Client, move |_| {
                Ok(Recorder { name: "client_only", log: b.clone(), fail_initialise: false })
            })
            .with_system("second", RegisterMode::Authority, move |_| {
                Ok(Recorder { name: "second", log: c.clone(), fail_initialise: fail })
            })
            .build()
            .unwrap();
        let mut context = Context::new();
        context.put_value(PrefabManager::new());
        (context, ModuleEnvironment::new(vec![Arc::new(module)]))
    }

    #[test]
    fn test_requires_complete_prefab_loading() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (context, environment) = setup(&log, false);
        let manager = ComponentSystemManager::new(&context).unwrap();

        let err = manager
            .load_systems(&environment, NetworkMode::DedicatedServer, &context)
            .unwrap_err();
        assert!(matches!(
            err,
            EnvError::InvalidLoaderState {
                actual: LoadStage::NotStarted,
                ..
            }
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_lifecycle_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (context, environment) = setup(&log, false);
        context.get::<PrefabManager>().unwrap().set_stage(LoadStage::Complete);
        let manager = ComponentSystemManager::new(&context).unwrap();

        let count = manager
            .load_systems(&environment, NetworkMode::DedicatedServer, &context)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(manager.system_ids(), vec!["test:first", "test:second"]);

        manager.initialise(&context).unwrap();
        manager.shutdown();
        manager.shutdown();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "init first",
                "init second",
                "post first",
                "post second",
                "shutdown second",
                "shutdown first",
            ]
        );
        assert!(manager.is_empty());
    }

    #[test]
    fn test_initialise_failure_names_system() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (context, environment) = setup(&log, true);
        context.get::<PrefabManager>().unwrap().set_stage(LoadStage::Complete);
        let manager = ComponentSystemManager::new(&context).unwrap();
        manager
            .load_systems(&environment, NetworkMode::DedicatedServer, &context)
            .unwrap();

        let err = manager.initialise(&context).unwrap_err();
        assert!(matches!(err, EnvError::SystemLoad { ref system, .. } if system == "test:second"));
        assert!(err.to_string().contains("cannot start second"));
    }

    #[test]
    fn test_with_system_downcasts() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (context, environment) = setup(&log, false);
        context.get::<PrefabManager>().unwrap().set_stage(LoadStage::Complete);
        let manager = ComponentSystemManager::new(&context).unwrap();
        manager
            .load_systems(&environment, NetworkMode::None, &context)
            .unwrap();
        assert_eq!(manager.len(), 3);
        assert_eq!(manager.with_system::<Recorder, _>(|r| r.name), Some("first"));
    }

    /// Looks up its peers through the manager while its own hooks run
    struct Inspector {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl ComponentSystem for Inspector {
        fn initialise(&mut self, context: &Context) -> anyhow::Result<()> {
            let manager = context.get::<ComponentSystemManager>()?;
            let mut seen = self.seen.lock().unwrap();
            seen.push(format!("contains first: {}", manager.contains("test:first")));
            seen.push(format!("len: {}", manager.len()));
            let peer = manager.with_system::<Recorder, _>(|r| r.name);
            seen.push(format!("peer: {:?}", peer));
            let itself = manager.with_system::<Inspector, _>(|_| ());
            seen.push(format!("itself: {:?}", itself));
            Ok(())
        }

        fn post_begin(&mut self) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push("post".to_string());
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_hooks_can_query_manager() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inspector_seen = seen.clone();
        let module = Module::builder("test", "1.0.0")
            .with_system("first", RegisterMode::Always, move |_| {
                Ok(Recorder { name: "first", log: log.clone(), fail_initialise: false })
            })
            .with_system("inspector", RegisterMode::Always, move |_| {
                Ok(Inspector { seen: inspector_seen.clone() })
            })
            .build()
            .unwrap();
        let environment = ModuleEnvironment::new(vec![Arc::new(module)]);

        let mut context = Context::new();
        context.put_value(PrefabManager::new());
        context.get::<PrefabManager>().unwrap().set_stage(LoadStage::Complete);
        let manager = Arc::new(ComponentSystemManager::new(&context).unwrap());
        context.put(manager.clone());

        manager
            .load_systems(&environment, NetworkMode::DedicatedServer, &context)
            .unwrap();
        manager.initialise(&context).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "contains first: true",
                "len: 2",
                "peer: Some(\"first\")",
                "itself: None",
                "post",
            ]
        );
        assert_eq!(manager.with_system::<Inspector, _>(|_| "idle"), Some("idle"));
    }
}
