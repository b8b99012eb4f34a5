//! Shared environment for a group of tests
//!
//! Tests that can tolerate shared state build one environment and reuse it:
//!
//! ```ignore
//! static SHARED: EnvironmentSlot = EnvironmentSlot::new();
//! SHARED.setup(ModuleTestingEnvironment::builder())?;
//! SHARED.with(|env| env.entity_manager());
//! ```
//!
//! Every access goes through the slot's lock, so tests using one slot are
//! serialised against each other.

use bevy::log::debug;
use std::sync::Mutex;

use super::{EnvironmentBuilder, ModuleTestingEnvironment};
use crate::error::Result;

pub struct EnvironmentSlot {
    slot: Mutex<Option<ModuleTestingEnvironment>>,
}

impl EnvironmentSlot {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Build a new environment in the slot, tearing down the previous one
    pub fn setup(&self, builder: EnvironmentBuilder) -> Result<()> {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(mut previous) = slot.take() {
            debug!("Replacing shared environment {}", previous.id());
            previous.teardown();
        }
        *slot = Some(builder.build()?);
        Ok(())
    }

    /// Run `f` against the shared environment, if one is set up
    pub fn with<R>(&self, f: impl FnOnce(&ModuleTestingEnvironment) -> R) -> Option<R> {
        let slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        slot.as_ref().map(f)
    }

    /// Tear down and clear the shared environment. No-op when empty.
    pub fn teardown(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(mut env) = slot.take() {
            env.teardown();
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .is_some()
    }
}

impl Default for EnvironmentSlot {
    fn default() -> Self {
        Self::new()
    }
}
