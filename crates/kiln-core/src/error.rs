//! # Kiln Core Errors
//!
//! Umbrella error type for fallible framework calls.
//!
//! Each subsystem owns a typed error (`ScanError`, `ResolutionError`,
//! `RegistrationError`, ...). [`Error`] wraps them so callers can use `?`
//! across subsystem boundaries, e.g. after [`StartupReport::into_result`].
//!
//! [`StartupReport::into_result`]: crate::lifecycle::StartupReport::into_result
use std::fmt::Display;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::command::error::{ArgumentError, RouteError};
use crate::config::error::ConfigError;
use crate::host::HostError;
use crate::injection::error::{BindingError, DependencyError};
use crate::lifecycle::error::StartupFailure;
use crate::version::VersionError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// A startup pass ended in `Failed`
    #[error("Startup failed: {0}")]
    Startup(#[from] StartupFailure),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Injection error: {0}")]
    Binding(#[from] BindingError),

    #[error("Dependency access error: {0}")]
    Dependency(#[from] DependencyError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("Argument error: {0}")]
    Argument(#[from] ArgumentError),

    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn other(message: impl Into<String>) -> Self {
        Error::Other(message.into())
    }
}

/// Result type for Kiln operations
pub type Result<T> = StdResult<T, Error>;

/// Boxed error returned by author supplied constructors and providers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Joins a list of errors into a single `; ` separated line for display.
pub(crate) fn join_display<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
