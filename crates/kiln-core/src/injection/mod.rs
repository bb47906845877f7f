//! # Kiln Core Injection
//!
//! The bridge between capabilities and the host's injection container.
//!
//! The engine only depends on the [`Container`] trait: a container hands out
//! fully constructed collaborators by key. [`Injector`] is the small keyed
//! registry bundled for hosts without a container of their own.
pub mod container;
pub mod error;
pub mod resolver;

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::config::{MessageCatalog, SchemaBinding};
use crate::constants::CONFIG_DEPENDENCY_PREFIX;

pub use container::{Injector, Scope};
pub use error::{BindingError, DependencyError, ResolutionError};
pub use resolver::Resolver;

/// A constructed collaborator as stored by a container.
pub type Instance = Arc<dyn Any + Send + Sync>;

pub trait Container: Send + Sync {
    /// Returns the instance bound to `key`, constructing it if needed.
    fn resolve(&self, key: &str) -> Result<Instance, BindingError>;

    fn contains(&self, key: &str) -> bool;
}

/// The resolved dependencies handed to a capability constructor, in
/// declaration order.
#[derive(Clone, Default)]
pub struct Dependencies {
    entries: Vec<(String, Instance)>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, instance: Instance) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = instance,
            None => self.entries.push((key, instance)),
        }
    }

    pub fn instance(&self, key: &str) -> Option<&Instance> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, instance)| instance)
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, DependencyError> {
        let instance = self.instance(key).ok_or_else(|| DependencyError::NotDeclared {
            key: key.to_string(),
        })?;
        Arc::clone(instance)
            .downcast::<T>()
            .map_err(|_| DependencyError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// The binding of a config schema declared by the same plugin, requested
    /// as the dependency `config:<identity>`.
    pub fn config(&self, identity: &str) -> Result<Arc<SchemaBinding>, DependencyError> {
        self.get::<SchemaBinding>(&format!("{}{}", CONFIG_DEPENDENCY_PREFIX, identity))
    }

    /// The `config:<identity>` section read as a message catalog.
    pub fn messages(&self, identity: &str) -> Result<MessageCatalog, DependencyError> {
        self.config(identity)
            .map(|binding| MessageCatalog::from_config(binding.values()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests;
