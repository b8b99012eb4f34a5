//! Dependency resolution: requested set -> ordered module environment
//!
//! Resolution runs in two passes. The first collects the closure of
//! required dependencies and checks versions, remembering which requested
//! module pulled each one in so failures name it. The second orders the
//! closure depth-first so dependencies load before their dependents;
//! optional dependencies only affect ordering.

use bevy::log::debug;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::{Module, ModuleEnvironment, ModuleName, ModuleRegistry, ModuleSet};
use crate::error::EnvError;

/// Resolve `requested` against `registry`
pub fn resolve(registry: &ModuleRegistry, requested: &ModuleSet) -> Result<ModuleEnvironment, EnvError> {
    let mut closure: BTreeMap<ModuleName, Arc<Module>> = BTreeMap::new();
    for root in requested.iter() {
        collect(registry, root, root, &mut closure)?;
    }
    check_optional_versions(&closure)?;

    let mut ordered = Vec::with_capacity(closure.len());
    let mut visited = HashSet::new();
    for name in closure.keys() {
        order(name, &closure, &mut visited, &mut ordered);
    }

    debug!(
        "Resolved modules: {:?}",
        ordered.iter().map(|m: &Arc<Module>| m.id().to_string()).collect::<Vec<_>>()
    );
    Ok(ModuleEnvironment::new(ordered))
}

fn collect(
    registry: &ModuleRegistry,
    name: &ModuleName,
    root: &ModuleName,
    closure: &mut BTreeMap<ModuleName, Arc<Module>>,
) -> Result<(), EnvError> {
    if closure.contains_key(name) {
        return Ok(());
    }
    let module = registry.get(name).ok_or_else(|| {
        if name == root {
            EnvError::module_load(root.as_str(), "module is not available")
        } else {
            EnvError::module_load(root.as_str(), format!("dependency `{}` is not available", name))
        }
    })?;
    closure.insert(name.clone(), module.clone());

    for dependency in module.dependencies().iter().filter(|d| !d.optional) {
        let Some(target) = registry.get(&dependency.id) else {
            return Err(EnvError::module_load(
                root.as_str(),
                format!("dependency `{}` of `{}` is not available", dependency.id, name),
            ));
        };
        if !dependency.version.matches(target.version()) {
            return Err(EnvError::module_load(
                root.as_str(),
                format!(
                    "`{}` requires `{}` {}, found {}",
                    name,
                    dependency.id,
                    dependency.version,
                    target.version()
                ),
            ));
        }
        collect(registry, &dependency.id, root, closure)?;
    }
    Ok(())
}

/// Optional dependencies that did get loaded must still be compatible
fn check_optional_versions(closure: &BTreeMap<ModuleName, Arc<Module>>) -> Result<(), EnvError> {
    for module in closure.values() {
        for dependency in module.dependencies().iter().filter(|d| d.optional) {
            if let Some(target) = closure.get(&dependency.id)
                && !dependency.version.matches(target.version())
            {
                return Err(EnvError::module_load(
                    module.id().as_str(),
                    format!(
                        "optional dependency `{}` {} is incompatible with loaded {}",
                        dependency.id,
                        dependency.version,
                        target.version()
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn order(
    name: &ModuleName,
    closure: &BTreeMap<ModuleName, Arc<Module>>,
    visited: &mut HashSet<ModuleName>,
    ordered: &mut Vec<Arc<Module>>,
) {
    if !visited.insert(name.clone()) {
        return;
    }
    let Some(module) = closure.get(name) else {
        return;
    };
    for dependency in module.dependencies() {
        if closure.contains_key(&dependency.id) {
            order(&dependency.id, closure, visited, ordered);
        }
    }
    ordered.push(module.clone());
}
