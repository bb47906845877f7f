use crate::capability::CapabilityKind;
use crate::host::SlotId;

/// Token for one live host registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationHandle {
    pub kind: CapabilityKind,
    pub identity: String,
    pub plugin: String,
    pub slot: SlotId,
}

/// Handles of one startup pass, in the order they were registered.
#[derive(Debug, Default)]
pub struct RegistrationLedger {
    handles: Vec<RegistrationHandle>,
}

impl RegistrationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, handle: RegistrationHandle) {
        self.handles.push(handle);
    }

    pub fn handles(&self) -> &[RegistrationHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Empties the ledger, newest handle first.
    pub fn drain_newest_first(&mut self) -> impl Iterator<Item = RegistrationHandle> + '_ {
        self.handles.drain(..).rev()
    }
}
