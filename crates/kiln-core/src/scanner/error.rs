use thiserror::Error;

use crate::capability::CapabilityKind;

/// A malformed declaration found while scanning a code unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("{kind} '{identity}' in {unit} is missing its {field}")]
    MissingMetadata {
        unit: String,
        kind: CapabilityKind,
        identity: String,
        field: &'static str,
    },

    #[error("{kind} '{identity}' in {unit} is invalid: {reason}")]
    InvalidMetadata {
        unit: String,
        kind: CapabilityKind,
        identity: String,
        reason: String,
    },

    #[error("{kind} '{identity}' in {unit} is already declared in {first_unit}")]
    DuplicateIdentity {
        unit: String,
        kind: CapabilityKind,
        identity: String,
        first_unit: String,
    },
}

impl ScanError {
    pub fn identity(&self) -> &str {
        match self {
            ScanError::MissingMetadata { identity, .. }
            | ScanError::InvalidMetadata { identity, .. }
            | ScanError::DuplicateIdentity { identity, .. } => identity,
        }
    }

    pub fn unit(&self) -> &str {
        match self {
            ScanError::MissingMetadata { unit, .. }
            | ScanError::InvalidMetadata { unit, .. }
            | ScanError::DuplicateIdentity { unit, .. } => unit,
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        match self {
            ScanError::MissingMetadata { kind, .. }
            | ScanError::InvalidMetadata { kind, .. }
            | ScanError::DuplicateIdentity { kind, .. } => *kind,
        }
    }
}
