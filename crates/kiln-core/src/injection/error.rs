//! # Kiln Core Injection Errors
//!
//! [`BindingError`] is what a [`Container`](crate::injection::Container)
//! reports for a single key. [`ResolutionError`] wraps it with the capability
//! that asked, or reports a failed constructor.
use thiserror::Error;

use crate::capability::CapabilityKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("No binding for '{key}'{}", .requested_by.as_ref().map(|by| format!(" (required by '{}')", by)).unwrap_or_default())]
    Unbound {
        key: String,
        requested_by: Option<String>,
    },

    /// The path starts and ends with the same key
    #[error("Circular dependency detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Provider for '{key}' failed: {message}")]
    Provider { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("{kind} '{capability}' cannot resolve dependency '{dependency}': {source}")]
    Dependency {
        capability: String,
        kind: CapabilityKind,
        dependency: String,
        #[source]
        source: BindingError,
    },

    #[error("{kind} '{capability}' failed to construct: {message}")]
    Construction {
        capability: String,
        kind: CapabilityKind,
        message: String,
    },
}

impl ResolutionError {
    pub fn capability(&self) -> &str {
        match self {
            ResolutionError::Dependency { capability, .. } | ResolutionError::Construction { capability, .. } => {
                capability
            }
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        match self {
            ResolutionError::Dependency { kind, .. } | ResolutionError::Construction { kind, .. } => *kind,
        }
    }
}

/// Typed access to a [`Dependencies`](crate::injection::Dependencies) entry failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("Dependency '{key}' was not declared")]
    NotDeclared { key: String },
    #[error("Dependency '{key}' is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}
