//! Entity subsystem: type libraries, prefabs and the entity manager

pub mod components;
pub mod library;
pub mod manager;
pub mod prefab;
pub mod setup;

pub use components::{DamageEvent, DisplayName, EntityInfo, Health, Location};
pub use library::{
    ComponentLibrary, ComponentMetadata, ComponentRegistration, EventLibrary, EventMetadata,
    EventRegistration,
};
pub use manager::{EntityError, EntityManager};
pub use prefab::{Prefab, PrefabManager, PrefabSource};
pub use setup::{add_entity_management_related_classes, add_reflection_based_libraries};
