//! Host double that records every call and fails on demand.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::capability::{CapabilityKind, CommandMetadata, ListenerMetadata};
use crate::command::CommandHandler;
use crate::config::SchemaBinding;
use crate::event::EventListener;
use crate::host::{Host, HostError, MemoryHost, SlotId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Register(CapabilityKind, String),
    Unregister(CapabilityKind, String),
}

#[derive(Default)]
struct Journal {
    calls: Vec<HostCall>,
    slots: HashMap<SlotId, (CapabilityKind, String)>,
    registrations: usize,
}

#[derive(Default)]
pub struct RecordingHost {
    inner: MemoryHost,
    journal: Mutex<Journal>,
    fail_on: Option<usize>,
    fail_unregister: Mutex<HashSet<String>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses the `k`-th registration call (0-based) of the host's lifetime.
    pub fn fail_on_registration(mut self, k: usize) -> Self {
        self.fail_on = Some(k);
        self
    }

    pub fn fail_unregister(self, identity: &str) -> Self {
        self.fail_unregister.lock().unwrap().insert(identity.to_string());
        self
    }

    /// Lets unregistration of `identity` succeed again.
    pub fn recover(&self, identity: &str) {
        self.fail_unregister.lock().unwrap().remove(identity);
    }

    pub fn memory(&self) -> &MemoryHost {
        &self.inner
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.journal.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.journal.lock().unwrap().calls.clear();
    }

    pub fn live(&self) -> usize {
        self.inner.registration_count()
    }

    fn register(
        &self,
        kind: CapabilityKind,
        identity: &str,
        register: impl FnOnce() -> Result<SlotId, HostError>,
    ) -> Result<SlotId, HostError> {
        let mut journal = self.journal.lock().unwrap();
        journal.calls.push(HostCall::Register(kind, identity.to_string()));
        let attempt = journal.registrations;
        journal.registrations += 1;
        if self.fail_on == Some(attempt) {
            return Err(HostError::Rejected {
                reason: format!("registration #{} refused", attempt),
            });
        }
        let slot = register()?;
        journal.slots.insert(slot, (kind, identity.to_string()));
        Ok(slot)
    }

    fn unregister(&self, slot: SlotId, unregister: impl FnOnce() -> Result<(), HostError>) -> Result<(), HostError> {
        let mut journal = self.journal.lock().unwrap();
        let Some((kind, identity)) = journal.slots.get(&slot).cloned() else {
            return unregister();
        };
        journal.calls.push(HostCall::Unregister(kind, identity.clone()));
        if self.fail_unregister.lock().unwrap().contains(&identity) {
            return Err(HostError::Unavailable {
                reason: format!("cannot drop '{}'", identity),
            });
        }
        unregister()
    }
}

impl Host for RecordingHost {
    fn register_command(
        &self,
        owner: &str,
        name: &str,
        metadata: &CommandMetadata,
        handlers: &[Arc<dyn CommandHandler>],
    ) -> Result<SlotId, HostError> {
        self.register(CapabilityKind::Command, name, || {
            self.inner.register_command(owner, name, metadata, handlers)
        })
    }

    fn register_listener(
        &self,
        owner: &str,
        identity: &str,
        metadata: &ListenerMetadata,
        listener: Arc<dyn EventListener>,
    ) -> Result<SlotId, HostError> {
        self.register(CapabilityKind::Listener, identity, || {
            self.inner.register_listener(owner, identity, metadata, listener)
        })
    }

    fn register_config_schema(&self, owner: &str, binding: Arc<SchemaBinding>) -> Result<SlotId, HostError> {
        let identity = binding.identity().to_string();
        self.register(CapabilityKind::ConfigSchema, &identity, || {
            self.inner.register_config_schema(owner, binding)
        })
    }

    fn unregister_command(&self, slot: SlotId) -> Result<(), HostError> {
        self.unregister(slot, || self.inner.unregister_command(slot))
    }

    fn unregister_listener(&self, slot: SlotId) -> Result<(), HostError> {
        self.unregister(slot, || self.inner.unregister_listener(slot))
    }

    fn unregister_config_schema(&self, slot: SlotId) -> Result<(), HostError> {
        self.unregister(slot, || self.inner.unregister_config_schema(slot))
    }
}
