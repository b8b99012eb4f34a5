//! Entity manager over a bevy `World`
//!
//! Entities are created from prefabs (or empty) and carry an [`EntityInfo`]
//! so the manager can tell its own entities apart from anything else the
//! world holds.

use bevy::ecs::query::With;
use bevy::log::debug;
use bevy::prelude::{Component, Entity, World};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use super::{ComponentLibrary, EntityInfo, PrefabManager};
use crate::assets::ResourceUrn;

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("prefab `{0}` is not loaded")]
    UnknownPrefab(String),

    #[error("entity {0} does not exist")]
    NoSuchEntity(Entity),

    #[error("component `{component}` of prefab `{prefab}` is unknown")]
    UnknownComponent { prefab: String, component: String },

    #[error("component `{component}` of prefab `{prefab}` is invalid: {source}")]
    InvalidComponent {
        prefab: String,
        component: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Creates, queries and destroys entities of one environment
pub struct EntityManager {
    world: RwLock<World>,
    components: Arc<ComponentLibrary>,
    prefabs: Arc<PrefabManager>,
}

impl EntityManager {
    pub fn new(components: Arc<ComponentLibrary>, prefabs: Arc<PrefabManager>) -> Self {
        Self {
            world: RwLock::new(World::new()),
            components,
            prefabs,
        }
    }

    pub fn component_library(&self) -> &Arc<ComponentLibrary> {
        &self.components
    }

    pub fn prefab_manager(&self) -> &Arc<PrefabManager> {
        &self.prefabs
    }

    fn read(&self) -> RwLockReadGuard<'_, World> {
        self.world.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, World> {
        self.world.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Entity with no components besides its bookkeeping
    pub fn create_empty(&self) -> Entity {
        self.write().spawn(EntityInfo { prefab: None }).id()
    }

    /// Instantiate a prefab by urn or unique bare name
    pub fn create(&self, prefab: &str) -> Result<Entity, EntityError> {
        let prefab = self
            .prefabs
            .get(prefab)
            .ok_or_else(|| EntityError::UnknownPrefab(prefab.to_string()))?;

        let mut world = self.write();
        let mut entity = world.spawn(EntityInfo {
            prefab: Some(prefab.urn.clone()),
        });
        for (component, value) in &prefab.components {
            let inserted = match self.components.resolve(&component.to_string(), None) {
                Some(metadata) => metadata.insert_into(&mut entity, value.clone()).map_err(|source| {
                    EntityError::InvalidComponent {
                        prefab: prefab.urn.to_string(),
                        component: component.to_string(),
                        source,
                    }
                }),
                None => Err(EntityError::UnknownComponent {
                    prefab: prefab.urn.to_string(),
                    component: component.to_string(),
                }),
            };
            if let Err(e) = inserted {
                entity.despawn();
                return Err(e);
            }
        }
        let id = entity.id();
        debug!("Created {} from {}", id, prefab.urn);
        Ok(id)
    }

    pub fn exists(&self, entity: Entity) -> bool {
        self.read().get::<EntityInfo>(entity).is_some()
    }

    pub fn get_component<C: Component + Clone>(&self, entity: Entity) -> Option<C> {
        self.read().get::<C>(entity).cloned()
    }

    pub fn has_component<C: Component>(&self, entity: Entity) -> bool {
        self.read().get::<C>(entity).is_some()
    }

    /// Insert or replace a component
    pub fn add_component<C: Component>(&self, entity: Entity, component: C) -> Result<(), EntityError> {
        let mut world = self.write();
        let mut entity_mut = world
            .get_entity_mut(entity)
            .map_err(|_| EntityError::NoSuchEntity(entity))?;
        entity_mut.insert(component);
        Ok(())
    }

    pub fn remove_component<C: Component>(&self, entity: Entity) -> Option<C> {
        let mut world = self.write();
        let mut entity_mut = world.get_entity_mut(entity).ok()?;
        entity_mut.take::<C>()
    }

    /// Despawn an entity; `false` if it did not exist
    pub fn destroy(&self, entity: Entity) -> bool {
        let mut world = self.write();
        match world.get_entity_mut(entity) {
            Ok(entity_mut) => {
                entity_mut.despawn();
                true
            }
            Err(_) => false,
        }
    }

    pub fn prefab_of(&self, entity: Entity) -> Option<ResourceUrn> {
        self.read()
            .get::<EntityInfo>(entity)
            .and_then(|info| info.prefab.clone())
    }

    /// All managed entities with their prefab
    pub fn entities(&self) -> Vec<(Entity, Option<ResourceUrn>)> {
        let mut world = self.write();
        let mut query = world.query::<(Entity, &EntityInfo)>();
        let mut entities: Vec<_> = query
            .iter(&world)
            .map(|(entity, info)| (entity, info.prefab.clone()))
            .collect();
        entities.sort_by_key(|(entity, _)| *entity);
        entities
    }

    /// Managed entities that have component `C`
    pub fn entities_with<C: Component>(&self) -> Vec<Entity> {
        let mut world = self.write();
        let mut query = world.query_filtered::<Entity, (With<EntityInfo>, With<C>)>();
        let mut entities: Vec<_> = query.iter(&world).collect();
        entities.sort();
        entities
    }

    pub fn entity_count(&self) -> usize {
        let mut world = self.write();
        let mut query = world.query::<&EntityInfo>();
        query.iter(&world).count()
    }

    /// Direct world access for systems that need queries
    pub fn with_world<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut self.write())
    }
}

impl std::fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityManager")
            .field("entities", &self.entity_count())
            .field("prefabs", &self.prefabs.len())
            .finish()
    }
}
