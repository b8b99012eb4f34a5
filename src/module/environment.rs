//! Resolved module environment

use std::sync::Arc;

use super::{Module, ModuleName};

/// Modules of one environment, dependencies before dependents
#[derive(Debug, Default)]
pub struct ModuleEnvironment {
    modules: Vec<Arc<Module>>,
}

impl ModuleEnvironment {
    /// `modules` must already be in load order
    pub fn new(modules: Vec<Arc<Module>>) -> Self {
        Self { modules }
    }

    pub fn modules(&self) -> &[Arc<Module>] {
        &self.modules
    }

    pub fn get(&self, name: &ModuleName) -> Option<&Arc<Module>> {
        self.modules.iter().find(|module| module.id() == name)
    }

    pub fn contains(&self, name: &ModuleName) -> bool {
        self.get(name).is_some()
    }

    /// Module ids in load order
    pub fn names(&self) -> Vec<&ModuleName> {
        self.modules.iter().map(|module| module.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
