//! The set of modules an environment is asked to load

use std::collections::BTreeSet;

use super::ModuleName;
use crate::constants::BASE_MODULE;
use crate::error::EnvError;

/// Deduplicated module names, always including the base module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSet {
    names: BTreeSet<ModuleName>,
}

impl ModuleSet {
    /// Just the base module
    pub fn base() -> Self {
        let mut names = BTreeSet::new();
        // BASE_MODULE is a valid identifier
        if let Ok(base) = ModuleName::new(BASE_MODULE) {
            names.insert(base);
        }
        Self { names }
    }

    /// Validate `names` and add the base module
    pub fn from_names<I, S>(names: I) -> Result<Self, EnvError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::base();
        for name in names {
            set.names.insert(ModuleName::new(name.as_ref())?);
        }
        Ok(set)
    }

    pub fn contains(&self, name: &ModuleName) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleName> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
