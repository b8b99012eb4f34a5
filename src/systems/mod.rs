//! Component systems: module-provided logic with a managed lifecycle

pub mod engine;
pub mod manager;

pub use manager::ComponentSystemManager;

use std::any::Any;
use std::sync::Arc;

use crate::console::ConsoleCommand;
use crate::context::Context;
use crate::network::NetworkMode;

/// Logic contributed by a module.
///
/// Hooks run in registration order: `initialise` for every system, then
/// `pre_begin`, then `post_begin`. `shutdown` runs in reverse order at
/// teardown.
pub trait ComponentSystem: Send + Sync {
    fn initialise(&mut self, _context: &Context) -> anyhow::Result<()> {
        Ok(())
    }

    fn pre_begin(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn post_begin(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Console commands this system provides
    fn commands(&self) -> Vec<ConsoleCommand> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any;
}

/// Which run modes load a system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterMode {
    /// Every run mode
    Always,
    /// Only where this side owns the simulation
    Authority,
    /// Only where a local player exists
    Client,
    /// Only on a client connected to a remote authority
    Remote,
}

impl RegisterMode {
    pub fn is_valid_for(self, mode: NetworkMode) -> bool {
        match self {
            RegisterMode::Always => true,
            RegisterMode::Authority => mode.is_authority(),
            RegisterMode::Client => mode.has_local_client(),
            RegisterMode::Remote => mode == NetworkMode::Client,
        }
    }
}

/// Constructs a system from the registry at load time
pub type SystemFactory = Arc<dyn Fn(&Context) -> anyhow::Result<Box<dyn ComponentSystem>> + Send + Sync>;

/// A system a module declares
#[derive(Clone)]
pub struct SystemDeclaration {
    pub name: String,
    pub mode: RegisterMode,
    pub factory: SystemFactory,
}

impl std::fmt::Debug for SystemDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemDeclaration")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .finish()
    }
}
