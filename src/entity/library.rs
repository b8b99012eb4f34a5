//! Component and event type libraries
//!
//! Libraries are rebuilt for every environment from its module set. Nothing
//! here is global: two environments never share a library instance.

use bevy::ecs::world::EntityWorldMut;
use bevy::log::{debug, warn};
use bevy::prelude::Component;
use serde::de::DeserializeOwned;
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

use crate::assets::ResourceUrn;
use crate::module::{ModuleEnvironment, ModuleName};

/// Deserialize a component from a prefab value and insert it on an entity
pub type InsertFn = fn(&mut EntityWorldMut<'_>, toml::Value) -> Result<(), toml::de::Error>;

fn insert_component<C>(entity: &mut EntityWorldMut<'_>, value: toml::Value) -> Result<(), toml::de::Error>
where
    C: Component + DeserializeOwned,
{
    let component: C = value.try_into()?;
    entity.insert(component);
    Ok(())
}

/// Component type as declared by a module
#[derive(Clone)]
pub struct ComponentRegistration {
    pub name: String,
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub insert: InsertFn,
}

impl ComponentRegistration {
    pub fn of<C>(name: &str) -> Self
    where
        C: Component + DeserializeOwned,
    {
        Self {
            name: name.to_string(),
            type_id: TypeId::of::<C>(),
            type_name: std::any::type_name::<C>(),
            insert: insert_component::<C>,
        }
    }
}

/// Event type as declared by a module
#[derive(Debug, Clone)]
pub struct EventRegistration {
    pub name: String,
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl EventRegistration {
    pub fn of<E: Send + Sync + 'static>(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
        }
    }
}

/// Registered component type
#[derive(Clone)]
pub struct ComponentMetadata {
    pub urn: ResourceUrn,
    pub type_id: TypeId,
    pub type_name: &'static str,
    insert: InsertFn,
}

impl ComponentMetadata {
    /// Deserialize `value` into this component and insert it on `entity`
    pub fn insert_into(
        &self,
        entity: &mut EntityWorldMut<'_>,
        value: toml::Value,
    ) -> Result<(), toml::de::Error> {
        (self.insert)(entity, value)
    }
}

impl std::fmt::Debug for ComponentMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentMetadata")
            .field("urn", &self.urn)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Registered event type
#[derive(Debug, Clone)]
pub struct EventMetadata {
    pub urn: ResourceUrn,
    pub type_id: TypeId,
    pub type_name: &'static str,
}

/// Bare-name lookup shared by both libraries: the context module wins, then
/// a unique match anywhere.
fn resolve_urn<'a, T>(
    entries: &'a BTreeMap<ResourceUrn, T>,
    name: &str,
    context: Option<&ModuleName>,
) -> Option<&'a T> {
    if ResourceUrn::is_qualified(name) {
        return ResourceUrn::parse(name).ok().and_then(|urn| entries.get(&urn));
    }
    if let Some(module) = context
        && let Ok(urn) = ResourceUrn::new(module, name)
        && let Some(entry) = entries.get(&urn)
    {
        return Some(entry);
    }
    let wanted = name.to_ascii_lowercase();
    let mut matches = entries.iter().filter(|(urn, _)| urn.resource() == wanted);
    match (matches.next(), matches.next()) {
        (Some((_, entry)), None) => Some(entry),
        _ => None,
    }
}

/// Component types known to one environment
#[derive(Debug, Default)]
pub struct ComponentLibrary {
    by_urn: BTreeMap<ResourceUrn, ComponentMetadata>,
    by_type: HashMap<TypeId, ResourceUrn>,
}

impl ComponentLibrary {
    /// Collect every component the loaded modules declare
    pub fn from_environment(environment: &ModuleEnvironment) -> Self {
        let mut library = Self::default();
        for module in environment.modules() {
            for registration in module.components() {
                library.register(module.id(), registration);
            }
        }
        debug!("Component library holds {} types", library.len());
        library
    }

    fn register(&mut self, module: &ModuleName, registration: &ComponentRegistration) {
        let urn = match ResourceUrn::new(module, &registration.name) {
            Ok(urn) => urn,
            Err(e) => {
                warn!("Skipping component {}: {}", registration.type_name, e);
                return;
            }
        };
        if let Some(existing) = self.by_type.get(&registration.type_id) {
            warn!(
                "Component {} already registered as {}, ignoring {}",
                registration.type_name, existing, urn
            );
            return;
        }
        if self.by_urn.contains_key(&urn) {
            warn!("Duplicate component urn {}, ignoring {}", urn, registration.type_name);
            return;
        }
        self.by_type.insert(registration.type_id, urn.clone());
        self.by_urn.insert(
            urn.clone(),
            ComponentMetadata {
                urn,
                type_id: registration.type_id,
                type_name: registration.type_name,
                insert: registration.insert,
            },
        );
    }

    /// Look a component up by prefab key (`health` or `engine:health`)
    pub fn resolve(&self, name: &str, context: Option<&ModuleName>) -> Option<&ComponentMetadata> {
        resolve_urn(&self.by_urn, name, context)
    }

    pub fn get_by_type<C: 'static>(&self) -> Option<&ComponentMetadata> {
        self.by_type
            .get(&TypeId::of::<C>())
            .and_then(|urn| self.by_urn.get(urn))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentMetadata> {
        self.by_urn.values()
    }

    pub fn len(&self) -> usize {
        self.by_urn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_urn.is_empty()
    }
}

/// Event types known to one environment
#[derive(Debug, Default)]
pub struct EventLibrary {
    by_urn: BTreeMap<ResourceUrn, EventMetadata>,
}

impl EventLibrary {
    pub fn from_environment(environment: &ModuleEnvironment) -> Self {
        let mut by_urn = BTreeMap::new();
        for module in environment.modules() {
            for registration in module.events() {
                match ResourceUrn::new(module.id(), &registration.name) {
                    Ok(urn) => {
                        by_urn.entry(urn.clone()).or_insert(EventMetadata {
                            urn,
                            type_id: registration.type_id,
                            type_name: registration.type_name,
                        });
                    }
                    Err(e) => warn!("Skipping event {}: {}", registration.type_name, e),
                }
            }
        }
        Self { by_urn }
    }

    pub fn resolve(&self, name: &str, context: Option<&ModuleName>) -> Option<&EventMetadata> {
        resolve_urn(&self.by_urn, name, context)
    }

    pub fn contains_type<E: 'static>(&self) -> bool {
        let type_id = TypeId::of::<E>();
        self.by_urn.values().any(|meta| meta.type_id == type_id)
    }

    pub fn len(&self) -> usize {
        self.by_urn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_urn.is_empty()
    }
}
