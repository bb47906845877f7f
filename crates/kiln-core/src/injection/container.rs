use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::BoxError;
use crate::injection::{BindingError, Container, Dependencies, Instance};

type ProviderFn = Arc<dyn Fn(&Dependencies) -> Result<Instance, BoxError> + Send + Sync>;

/// How often a provider runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Once; later requests share the first instance
    #[default]
    Singleton,
    /// On every request
    Transient,
}

enum Binding {
    Instance(Instance),
    Provider {
        dependencies: Vec<String>,
        factory: ProviderFn,
        scope: Scope,
    },
}

/// Keyed injection container.
///
/// Providers declare the keys they depend on. Resolution walks them depth
/// first with an in-progress stack, so a key that depends on itself, directly
/// or through others, is reported as [`BindingError::Cycle`].
#[derive(Default)]
pub struct Injector {
    bindings: HashMap<String, Binding>,
    singletons: Mutex<HashMap<String, Instance>>,
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an already constructed value.
    pub fn bind_instance<T>(&mut self, key: impl Into<String>, value: T) -> &mut Self
    where
        T: Any + Send + Sync,
    {
        self.bind_shared(key, Arc::new(value))
    }

    pub fn bind_shared<T>(&mut self, key: impl Into<String>, value: Arc<T>) -> &mut Self
    where
        T: Any + Send + Sync,
    {
        self.insert(key.into(), Binding::Instance(value))
    }

    /// Binds a singleton provider that runs on first request.
    pub fn bind_provider<T, F>(&mut self, key: impl Into<String>, dependencies: &[&str], factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&Dependencies) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.bind_scoped(key, dependencies, Scope::Singleton, factory)
    }

    pub fn bind_scoped<T, F>(
        &mut self,
        key: impl Into<String>,
        dependencies: &[&str],
        scope: Scope,
        factory: F,
    ) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&Dependencies) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let factory: ProviderFn = Arc::new(move |deps: &Dependencies| {
            factory(deps).map(|value| Arc::new(value) as Instance)
        });
        self.insert(
            key.into(),
            Binding::Provider {
                dependencies: dependencies.iter().map(|dep| dep.to_string()).collect(),
                factory,
                scope,
            },
        )
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn insert(&mut self, key: String, binding: Binding) -> &mut Self {
        if self.bindings.contains_key(&key) {
            log::warn!("Rebinding injection key '{}'", key);
            self.cache().remove(&key);
        }
        self.bindings.insert(key, binding);
        self
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Instance>> {
        self.singletons.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn resolve_key(&self, key: &str, stack: &mut Vec<String>) -> Result<Instance, BindingError> {
        if let Some(start) = stack.iter().position(|pending| pending == key) {
            let mut path = stack[start..].to_vec();
            path.push(key.to_string());
            return Err(BindingError::Cycle { path });
        }

        let binding = self.bindings.get(key).ok_or_else(|| BindingError::Unbound {
            key: key.to_string(),
            requested_by: stack.last().cloned(),
        })?;

        let (dependencies, factory, scope) = match binding {
            Binding::Instance(instance) => return Ok(Arc::clone(instance)),
            Binding::Provider { dependencies, factory, scope } => (dependencies, factory, *scope),
        };

        if scope == Scope::Singleton {
            if let Some(cached) = self.cache().get(key) {
                return Ok(Arc::clone(cached));
            }
        }

        stack.push(key.to_string());
        let resolved = self.resolve_dependencies(dependencies, stack);
        stack.pop();
        let deps = resolved?;

        let instance = factory(&deps).map_err(|err| BindingError::Provider {
            key: key.to_string(),
            message: err.to_string(),
        })?;

        if scope == Scope::Singleton {
            let mut cache = self.cache();
            let shared = cache.entry(key.to_string()).or_insert(instance);
            return Ok(Arc::clone(shared));
        }
        Ok(instance)
    }

    fn resolve_dependencies(&self, keys: &[String], stack: &mut Vec<String>) -> Result<Dependencies, BindingError> {
        let mut deps = Dependencies::new();
        for dep in keys {
            let instance = self.resolve_key(dep, stack)?;
            deps.insert(dep.clone(), instance);
        }
        Ok(deps)
    }
}

impl Container for Injector {
    fn resolve(&self, key: &str) -> Result<Instance, BindingError> {
        self.resolve_key(key, &mut Vec::new())
    }

    fn contains(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.bindings.keys().collect();
        keys.sort();
        f.debug_struct("Injector").field("bindings", &keys).finish_non_exhaustive()
    }
}
