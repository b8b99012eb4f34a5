//! Type-keyed capability registry
//!
//! The context maps a capability type to exactly one shared instance. A
//! capability is usually a trait object (`dyn Time`, `dyn WorldProvider`),
//! sometimes a concrete manager (`BlockManager`). Values are handed out as
//! `Arc`s: a later `put` replaces the entry, and anyone still holding the old
//! `Arc` keeps a detached instance. Always re-fetch after setup stages run.

use bevy::log::debug;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Lookup of a capability that was never registered (or was removed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("`{type_name}` is not registered")]
pub struct NotRegistered {
    pub type_name: &'static str,
}

/// A single registry slot
struct Entry {
    type_name: &'static str,
    /// Always an `Arc<T>` for the `T` whose `TypeId` keys this entry
    value: Box<dyn Any + Send + Sync>,
}

/// Registry threaded through every setup stage
#[derive(Default)]
pub struct Context {
    entries: HashMap<TypeId, Entry>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `instance` as the single instance of capability `T`.
    ///
    /// An existing registration is replaced without notice.
    pub fn put<T>(&mut self, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let previous = self.entries.insert(
            TypeId::of::<T>(),
            Entry {
                type_name,
                value: Box::new(instance),
            },
        );
        if previous.is_some() {
            debug!("Context: replaced {}", type_name);
        }
    }

    /// Convenience for `put(Arc::new(value))`
    pub fn put_value<T>(&mut self, value: T) -> Arc<T>
    where
        T: Send + Sync + 'static,
    {
        let instance = Arc::new(value);
        self.put(instance.clone());
        instance
    }

    /// Current instance of capability `T`
    pub fn get<T>(&self) -> Result<Arc<T>, NotRegistered>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_ref::<Arc<T>>())
            .cloned()
            .ok_or(NotRegistered {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Whether capability `T` currently has an instance
    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Remove and return the instance of capability `T`
    pub fn remove<T>(&mut self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast::<Arc<T>>().ok())
            .map(|boxed| *boxed)
    }

    /// Number of registered capabilities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Type names of all registered capabilities, sorted
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.values().map(|entry| entry.type_name).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("registered", &self.registered_types())
            .finish()
    }
}
