use std::fmt;

use crate::capability::CapabilityKind;
use crate::error::{Error, Result};
use crate::lifecycle::LifecycleState;
use crate::lifecycle::error::StartupFailure;
use crate::registrar::UnregistrationWarning;

/// What happened to one capability during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Registered,
    Failed { reason: String },
    RolledBack,
    RollbackFailed { reason: String },
    Unregistered,
    UnregisterFailed { reason: String },
    NotAttempted,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Registered => f.write_str("registered"),
            OutcomeStatus::Failed { reason } => write!(f, "failed: {}", reason),
            OutcomeStatus::RolledBack => f.write_str("rolled back"),
            OutcomeStatus::RollbackFailed { reason } => write!(f, "rollback failed: {}", reason),
            OutcomeStatus::Unregistered => f.write_str("unregistered"),
            OutcomeStatus::UnregisterFailed { reason } => write!(f, "unregister failed: {}", reason),
            OutcomeStatus::NotAttempted => f.write_str("not attempted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityOutcome {
    pub kind: CapabilityKind,
    pub identity: String,
    pub status: OutcomeStatus,
}

impl CapabilityOutcome {
    pub(crate) fn new(kind: CapabilityKind, identity: impl Into<String>, status: OutcomeStatus) -> Self {
        Self {
            kind,
            identity: identity.into(),
            status,
        }
    }
}

impl fmt::Display for CapabilityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}': {}", self.kind, self.identity, self.status)
    }
}

/// Result of [`LifecycleController::start`](crate::lifecycle::LifecycleController::start).
///
/// One outcome per capability, in registration order. After a rollback the
/// capabilities registered earlier in the pass read `RolledBack` (or
/// `RollbackFailed`) and those after the refused one read `NotAttempted`.
#[derive(Debug)]
pub struct StartupReport {
    pub plugin: String,
    pub state: LifecycleState,
    pub outcomes: Vec<CapabilityOutcome>,
    pub failure: Option<StartupFailure>,
    pub warnings: Vec<UnregistrationWarning>,
}

impl StartupReport {
    pub(crate) fn new(plugin: impl Into<String>, state: LifecycleState) -> Self {
        Self {
            plugin: plugin.into(),
            state,
            outcomes: Vec::new(),
            failure: None,
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Capabilities left registered by the pass.
    pub fn registered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == OutcomeStatus::Registered)
            .count()
    }

    pub fn outcome_of(&self, identity: &str) -> Option<&CapabilityOutcome> {
        self.outcomes.iter().find(|outcome| outcome.identity == identity)
    }

    /// Converts a failed report into [`Error::Startup`].
    pub fn into_result(mut self) -> Result<Self> {
        match self.failure.take() {
            Some(failure) => Err(Error::Startup(failure)),
            None => Ok(self),
        }
    }
}

impl fmt::Display for StartupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Startup of '{}' ended in {}", self.plugin, self.state)?;
        for outcome in &self.outcomes {
            writeln!(f, "  {}", outcome)?;
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {}", warning)?;
        }
        if let Some(failure) = &self.failure {
            writeln!(f, "  cause: {}", failure)?;
        }
        Ok(())
    }
}

/// Result of [`LifecycleController::stop`](crate::lifecycle::LifecycleController::stop).
///
/// A stop outside `Active` yields an empty report with no plugin name.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    pub plugin: Option<String>,
    pub state: LifecycleState,
    pub outcomes: Vec<CapabilityOutcome>,
    pub warnings: Vec<UnregistrationWarning>,
}

impl ShutdownReport {
    pub fn is_noop(&self) -> bool {
        self.plugin.is_none() && self.outcomes.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn unregistered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == OutcomeStatus::Unregistered)
            .count()
    }
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plugin {
            Some(plugin) => writeln!(f, "Shutdown of '{}' ended in {}", plugin, self.state)?,
            None => writeln!(f, "Nothing to shut down ({})", self.state)?,
        }
        for outcome in &self.outcomes {
            writeln!(f, "  {}", outcome)?;
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {}", warning)?;
        }
        Ok(())
    }
}
