//! Modules: identifiers, descriptors, catalog, resolution and the base module

pub mod base;
pub mod descriptor;
pub mod environment;
pub mod manager;
pub mod name;
pub mod registry;
pub mod resolver;
pub mod set;

pub use descriptor::{AssetDefinition, DependencyInfo, Module, ModuleBuilder, ModuleMetadata};
pub use environment::ModuleEnvironment;
pub use manager::ModuleManager;
pub use name::ModuleName;
pub use registry::{ModuleRegistry, load_module_directory};
pub use set::ModuleSet;
