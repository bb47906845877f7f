use std::collections::HashMap;
use std::sync::Arc;

use crate::capability::descriptor::Definition;
use crate::capability::{CapabilityDescriptor, CapabilityInstance, CapabilityKind, CapabilityObject};
use crate::config::{ConfigSource, SchemaBinding};
use crate::constants::CONFIG_DEPENDENCY_PREFIX;
use crate::injection::{BindingError, Container, Dependencies, Instance, ResolutionError};

/// Turns descriptors into constructed capability instances.
///
/// Container keys come from the [`Container`]; `config:<identity>` keys are
/// served from the schemas this resolver has already bound, which is why
/// [`Resolver::resolve_all`] binds schemas first.
pub struct Resolver<'a> {
    container: &'a dyn Container,
    config: &'a dyn ConfigSource,
    schemas: HashMap<String, Arc<SchemaBinding>>,
}

impl<'a> Resolver<'a> {
    pub fn new(container: &'a dyn Container, config: &'a dyn ConfigSource) -> Self {
        Self {
            container,
            config,
            schemas: HashMap::new(),
        }
    }

    /// Resolves every descriptor, collecting all errors.
    ///
    /// Instances come back in the order of `descriptors`.
    pub fn resolve_all(
        &mut self,
        descriptors: &[CapabilityDescriptor],
    ) -> Result<Vec<CapabilityInstance>, Vec<ResolutionError>> {
        let mut slots: Vec<Option<CapabilityInstance>> = vec![None; descriptors.len()];
        let mut errors = Vec::new();

        let (schemas, others): (Vec<_>, Vec<_>) = descriptors
            .iter()
            .enumerate()
            .partition(|(_, descriptor)| descriptor.kind() == CapabilityKind::ConfigSchema);

        for (index, descriptor) in schemas.into_iter().chain(others) {
            match self.resolve(descriptor) {
                Ok(instance) => slots[index] = Some(instance),
                Err(mut failed) => errors.append(&mut failed),
            }
        }

        if errors.is_empty() {
            Ok(slots.into_iter().flatten().collect())
        } else {
            Err(errors)
        }
    }

    pub fn resolve(&mut self, descriptor: &CapabilityDescriptor) -> Result<CapabilityInstance, Vec<ResolutionError>> {
        let object = match descriptor.definition() {
            Definition::ConfigSchema { metadata } => {
                let section = self
                    .config
                    .section(descriptor.identity())
                    .map_err(|err| vec![construction_error(descriptor, err.to_string())])?;
                let binding = SchemaBinding::bind(
                    descriptor.identity(),
                    &metadata.type_name,
                    &metadata.defaults,
                    section.as_ref(),
                    &metadata.validator,
                )
                .map_err(|err| vec![construction_error(descriptor, err.to_string())])?;
                let binding = Arc::new(binding);
                self.schemas
                    .insert(descriptor.identity().to_string(), Arc::clone(&binding));
                CapabilityObject::ConfigSchema(binding)
            }
            Definition::Command { metadata, constructors } => {
                let deps = self.dependencies(descriptor)?;
                let handlers = constructors
                    .iter()
                    .map(|constructor| constructor(&deps))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|err| vec![construction_error(descriptor, err.to_string())])?;
                CapabilityObject::Command {
                    metadata: metadata.clone(),
                    handlers,
                }
            }
            Definition::Listener { metadata, constructor } => {
                let deps = self.dependencies(descriptor)?;
                let listener = constructor(&deps).map_err(|err| vec![construction_error(descriptor, err.to_string())])?;
                CapabilityObject::Listener {
                    metadata: metadata.clone(),
                    listener,
                }
            }
        };

        log::debug!("Resolved {} '{}'", descriptor.kind(), descriptor.identity());
        Ok(CapabilityInstance::new(descriptor.clone(), object))
    }

    /// Requests every declared dependency in order; all failures are reported.
    fn dependencies(&self, descriptor: &CapabilityDescriptor) -> Result<Dependencies, Vec<ResolutionError>> {
        let mut deps = Dependencies::new();
        let mut errors = Vec::new();

        for key in descriptor.dependencies() {
            match self.request(key) {
                Ok(instance) => deps.insert(key.clone(), instance),
                Err(source) => errors.push(ResolutionError::Dependency {
                    capability: descriptor.identity().to_string(),
                    kind: descriptor.kind(),
                    dependency: key.clone(),
                    source,
                }),
            }
        }

        if errors.is_empty() { Ok(deps) } else { Err(errors) }
    }

    fn request(&self, key: &str) -> Result<Instance, BindingError> {
        match key.strip_prefix(CONFIG_DEPENDENCY_PREFIX) {
            Some(schema) => self
                .schemas
                .get(schema)
                .map(|binding| Arc::clone(binding) as Instance)
                .ok_or_else(|| BindingError::Unbound {
                    key: key.to_string(),
                    requested_by: None,
                }),
            None => self.container.resolve(key),
        }
    }
}

fn construction_error(descriptor: &CapabilityDescriptor, message: String) -> ResolutionError {
    ResolutionError::Construction {
        capability: descriptor.identity().to_string(),
        kind: descriptor.kind(),
        message,
    }
}
