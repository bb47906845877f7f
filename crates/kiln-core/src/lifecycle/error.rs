use thiserror::Error;

use crate::error::join_display;
use crate::injection::ResolutionError;
use crate::lifecycle::LifecycleState;
use crate::registrar::RegistrationError;
use crate::scanner::ScanError;

/// Why a startup pass ended in `Failed` (or never began).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupFailure {
    #[error("start is not accepted while the plugin is {state}")]
    InvalidState { state: LifecycleState },

    #[error("plugin '{plugin}' {version} requires API {required}, host provides {api}")]
    IncompatibleApi {
        plugin: String,
        version: String,
        required: String,
        api: String,
    },

    #[error("{} invalid declaration(s): {}", .0.len(), join_display(.0))]
    Scan(Vec<ScanError>),

    #[error("{} unresolved capability error(s): {}", .0.len(), join_display(.0))]
    Resolution(Vec<ResolutionError>),

    #[error("{count} registration(s) from the previous run could not be released")]
    Leftovers { count: usize },

    #[error("{0}; the pass was rolled back")]
    Registration(#[source] RegistrationError),
}
