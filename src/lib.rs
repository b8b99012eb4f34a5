//! Module testing environment - headless engine runtime for integration tests
//!
//! Builds a fresh, fully wired engine per test: the requested modules are
//! resolved and loaded, subsystems that need a window, a network or a real
//! clock are swapped for headless stand-ins, prefabs are loaded and component
//! systems are started. Teardown releases all of it.

// Core modules
pub mod constants;
pub mod context;
pub mod error;
pub mod logging;
pub mod settings;

// Module loading
pub mod assets;
pub mod headless;
pub mod module;

// Engine subsystems
pub mod audio;
pub mod config;
pub mod console;
pub mod display;
pub mod entity;
pub mod game;
pub mod network;
pub mod paths;
pub mod persistence;
pub mod physics;
pub mod sandbox;
pub mod time;
pub mod world;

// Environment lifecycle
pub mod environment;
pub mod loading;
pub mod systems;

// Re-export commonly used types for convenience
pub use console::{Console, ConsoleCommand, ConsoleError, ConsoleImpl};
pub use context::{Context, NotRegistered};
pub use entity::{EntityManager, PrefabManager};
pub use environment::{EnvironmentBuilder, EnvironmentSlot, ModuleTestCase, ModuleTestingEnvironment};
pub use error::{EnvError, Result};
pub use headless::{HeadlessEnvironment, HeadlessModuleLoader, ModuleLoader};
pub use loading::{LoadPrefabs, LoadProcess, LoadStage};
pub use logging::init_test_logging;
pub use module::{Module, ModuleEnvironment, ModuleName, ModuleRegistry, ModuleSet};
pub use network::NetworkMode;
pub use settings::HarnessSettings;
pub use systems::{ComponentSystem, ComponentSystemManager, RegisterMode};
pub use time::{MockTime, Time};
