//! Setup failure taxonomy
//!
//! Every variant is fatal to the environment being built. Setup never retries
//! or repairs a partially wired registry; teardown is the only cleanup path.

use thiserror::Error;

use crate::context::NotRegistered;
use crate::loading::LoadStage;

/// Result alias used throughout environment setup
pub type Result<T, E = EnvError> = std::result::Result<T, E>;

/// Errors that abort building a module testing environment
#[derive(Debug, Error)]
pub enum EnvError {
    /// The sandboxed home directory could not be created
    #[error("failed to create sandboxed home directory")]
    SandboxInit(#[source] std::io::Error),

    /// A requested module name is not a well-formed identifier
    #[error("invalid module name `{name}`: {reason}")]
    InvalidModuleName { name: String, reason: &'static str },

    /// A module or one of its dependencies could not be loaded
    #[error("failed to load module `{module}`: {reason}")]
    ModuleLoad { module: String, reason: String },

    /// A capability the next stage depends on is not in the registry
    #[error("required subsystem is missing: {0}")]
    MissingSubsystem(#[from] NotRegistered),

    /// Loadable content could not be enumerated before prefab loading
    #[error("failed to set up prefab loading: {0}")]
    LoadSetup(String),

    /// A staged loader operation was called from the wrong stage
    #[error("invalid loader state for `{operation}`: loader is {actual:?}")]
    InvalidLoaderState {
        operation: &'static str,
        actual: LoadStage,
    },

    /// A single prefab failed to parse or resolve
    #[error("failed to load prefab `{urn}`: {reason}")]
    PrefabLoad { urn: String, reason: String },

    /// A component system failed to construct or run a lifecycle hook
    #[error("component system `{system}` failed: {source:#}")]
    SystemLoad {
        system: String,
        #[source]
        source: anyhow::Error,
    },

    /// Storage could not be wired against the sandbox
    #[error("storage error: {0}")]
    Storage(#[from] crate::persistence::StorageError),
}

impl EnvError {
    /// Shorthand for module loading failures
    pub fn module_load(module: impl Into<String>, reason: impl Into<String>) -> Self {
        EnvError::ModuleLoad {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Name of the subsystem type for `MissingSubsystem`, if that is the variant
    pub fn missing_subsystem(&self) -> Option<&'static str> {
        match self {
            EnvError::MissingSubsystem(missing) => Some(missing.type_name),
            _ => None,
        }
    }
}
