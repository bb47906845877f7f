use thiserror::Error;

use crate::capability::CapabilityKind;
use crate::host::{HostError, SlotId};

/// The host refused a registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Registration of {kind} '{capability}' for plugin '{plugin}' failed: {source}")]
pub struct RegistrationError {
    pub plugin: String,
    pub kind: CapabilityKind,
    pub capability: String,
    #[source]
    pub source: HostError,
}

/// An unregister call failed. Never fatal; reported alongside the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not unregister {kind} '{capability}' ({slot}): {source}")]
pub struct UnregistrationWarning {
    pub kind: CapabilityKind,
    pub capability: String,
    pub slot: SlotId,
    #[source]
    pub source: HostError,
}
