//! # Kiln Core Registrar
//!
//! Binds constructed capabilities to the host registries. Each successful
//! call performs exactly one host mutation and records a
//! [`RegistrationHandle`] in the ledger lent by the lifecycle controller.
pub mod error;
pub mod ledger;

use crate::capability::{CapabilityInstance, CapabilityKind, CapabilityObject};
use crate::host::Host;

pub use error::{RegistrationError, UnregistrationWarning};
pub use ledger::{RegistrationHandle, RegistrationLedger};

/// Registers and unregisters one plugin's capabilities with a host.
pub struct Registrar<'a> {
    host: &'a dyn Host,
    plugin: &'a str,
}

impl<'a> Registrar<'a> {
    /// A registrar acting for `plugin` on `host`.
    pub fn new(host: &'a dyn Host, plugin: &'a str) -> Self {
        Self { host, plugin }
    }

    /// Sorts instances into registration order: config schemas, then
    /// listeners, then commands. The sort is stable, so discovery order
    /// holds within a kind.
    pub fn order(mut instances: Vec<CapabilityInstance>) -> Vec<CapabilityInstance> {
        instances.sort_by_key(|instance| instance.kind().registration_rank());
        instances
    }

    /// Hands `instance` to the matching host registry and records the
    /// returned handle in `ledger`.
    ///
    /// A refused registration leaves the ledger untouched and is returned as
    /// a [`RegistrationError`] naming the plugin and capability.
    pub fn register(
        &self,
        instance: &CapabilityInstance,
        ledger: &mut RegistrationLedger,
    ) -> Result<RegistrationHandle, RegistrationError> {
        let identity = instance.identity();
        let result = match instance.object() {
            CapabilityObject::ConfigSchema(binding) => self.host.register_config_schema(self.plugin, binding.clone()),
            CapabilityObject::Listener { metadata, listener } => {
                self.host
                    .register_listener(self.plugin, identity, metadata, listener.clone())
            }
            CapabilityObject::Command { metadata, handlers } => {
                self.host.register_command(self.plugin, identity, metadata, handlers)
            }
        };

        let slot = result.map_err(|source| RegistrationError {
            plugin: self.plugin.to_string(),
            kind: instance.kind(),
            capability: identity.to_string(),
            source,
        })?;

        let handle = RegistrationHandle {
            kind: instance.kind(),
            identity: identity.to_string(),
            plugin: self.plugin.to_string(),
            slot,
        };
        log::debug!("Registered {} '{}' as {}", handle.kind, handle.identity, slot);
        ledger.record(handle.clone());
        Ok(handle)
    }

    /// Removes the registration behind `handle` from the host.
    ///
    /// The ledger is not touched; the caller decides whether a failed handle
    /// is kept for a later retry.
    pub fn unregister(&self, handle: &RegistrationHandle) -> Result<(), UnregistrationWarning> {
        let result = match handle.kind {
            CapabilityKind::ConfigSchema => self.host.unregister_config_schema(handle.slot),
            CapabilityKind::Listener => self.host.unregister_listener(handle.slot),
            CapabilityKind::Command => self.host.unregister_command(handle.slot),
        };
        result.map_err(|source| UnregistrationWarning {
            kind: handle.kind,
            capability: handle.identity.clone(),
            slot: handle.slot,
            source,
        })
    }
}
