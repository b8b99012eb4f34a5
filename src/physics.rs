//! Collision group registry
//!
//! Groups are bit flags in a 16-bit mask. The built-in engine groups take the
//! first slots, module groups follow in module load order.

use bevy::log::warn;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::assets::ResourceUrn;
use crate::constants::{BUILT_IN_COLLISION_GROUPS, MAX_COLLISION_GROUPS};
use crate::module::ModuleEnvironment;

#[derive(Debug, Error, PartialEq)]
pub enum CollisionGroupError {
    #[error("no collision group slot left for `{0}` ({MAX_COLLISION_GROUPS} in use)")]
    Exhausted(String),
}

/// A named collision group and its flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionGroup {
    pub flag: u16,
}

impl CollisionGroup {
    pub fn index(self) -> u32 {
        self.flag.trailing_zeros()
    }
}

#[derive(Debug)]
pub struct CollisionGroupManager {
    groups: BTreeMap<String, CollisionGroup>,
}

impl CollisionGroupManager {
    /// Built-in groups only
    pub fn new() -> Self {
        let groups = BUILT_IN_COLLISION_GROUPS
            .iter()
            .enumerate()
            .map(|(index, name)| (name.to_string(), CollisionGroup { flag: 1 << index }))
            .collect();
        Self { groups }
    }

    /// Built-in groups plus every group the loaded modules declare
    pub fn from_environment(environment: &ModuleEnvironment) -> Result<Self, CollisionGroupError> {
        let mut manager = Self::new();
        for module in environment.modules() {
            for name in module.collision_groups() {
                match ResourceUrn::new(module.id(), name) {
                    Ok(urn) => {
                        manager.register(&urn.to_string())?;
                    }
                    Err(e) => warn!("Skipping collision group {} of {}: {}", name, module.id(), e),
                }
            }
        }
        Ok(manager)
    }

    /// Group for `name`, allocating the next free flag if it is new
    pub fn register(&mut self, name: &str) -> Result<CollisionGroup, CollisionGroupError> {
        let key = name.to_ascii_lowercase();
        if let Some(group) = self.groups.get(&key) {
            return Ok(*group);
        }
        let index = self.groups.len();
        if index >= MAX_COLLISION_GROUPS {
            return Err(CollisionGroupError::Exhausted(key));
        }
        let group = CollisionGroup { flag: 1 << index };
        self.groups.insert(key, group);
        Ok(group)
    }

    pub fn get(&self, name: &str) -> Option<CollisionGroup> {
        self.groups.get(&name.to_ascii_lowercase()).copied()
    }

    /// Combined mask of several groups; unknown names are skipped
    pub fn mask(&self, names: &[&str]) -> u16 {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .fold(0, |mask, group| mask | group.flag)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Default for CollisionGroupManager {
    fn default() -> Self {
        Self::new()
    }
}
