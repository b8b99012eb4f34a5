//! Wiring of the entity subsystem into a context

use bevy::log::debug;
use std::sync::Arc;

use super::{ComponentLibrary, EntityManager, EventLibrary, PrefabManager};
use crate::context::Context;
use crate::module::ModuleEnvironment;

/// Build fresh component and event libraries from the loaded modules
pub fn add_reflection_based_libraries(context: &mut Context, environment: &ModuleEnvironment) {
    let components = context.put_value(ComponentLibrary::from_environment(environment));
    let events = context.put_value(EventLibrary::from_environment(environment));
    debug!(
        "Registered libraries: {} components, {} events",
        components.len(),
        events.len()
    );
}

/// Build a fresh prefab manager and an entity manager over the registered
/// component library
pub fn add_entity_management_related_classes(context: &mut Context) -> crate::error::Result<Arc<EntityManager>> {
    let components = context.get::<ComponentLibrary>()?;
    let prefabs = context.put_value(PrefabManager::new());
    Ok(context.put_value(EntityManager::new(components, prefabs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_manager_needs_libraries() {
        let mut context = Context::new();
        let err = add_entity_management_related_classes(&mut context).unwrap_err();
        assert!(err.missing_subsystem().unwrap().contains("ComponentLibrary"));
    }

    #[test]
    fn test_setup_registers_fresh_instances() {
        let mut context = Context::new();
        let environment = ModuleEnvironment::default();
        add_reflection_based_libraries(&mut context, &environment);
        let first = add_entity_management_related_classes(&mut context).unwrap();
        let second = add_entity_management_related_classes(&mut context).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&context.get::<EntityManager>().unwrap(), &second));
        assert!(context.contains::<EventLibrary>());
        assert!(context.contains::<PrefabManager>());
    }
}
