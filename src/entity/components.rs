//! Components and events the base module provides

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assets::ResourceUrn;

/// Bookkeeping every managed entity carries
#[derive(Component, Debug, Clone, PartialEq)]
pub struct EntityInfo {
    /// Prefab the entity was created from, if any
    pub prefab: Option<ResourceUrn>,
}

/// Position in world space
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Location {
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayName {
    pub name: String,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub max: u32,
    /// Defaults to `max` when omitted in a prefab
    #[serde(default)]
    pub current: Option<u32>,
}

impl Health {
    pub fn current(&self) -> u32 {
        self.current.unwrap_or(self.max)
    }

    pub fn is_dead(&self) -> bool {
        self.current() == 0
    }
}

/// Damage dealt to an entity with [`Health`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub target: Entity,
    pub amount: u32,
}
