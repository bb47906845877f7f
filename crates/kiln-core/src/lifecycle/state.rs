use std::fmt;

/// Where a controller is in its startup/shutdown cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Unstarted,
    Scanning,
    Resolving,
    Registering,
    Active,
    /// Unwinding registrations; `rollback` marks a failed startup
    ShuttingDown { rollback: bool },
    Stopped,
    /// Terminal
    Failed,
}

impl LifecycleState {
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Unstarted | Stopped, Scanning)
                | (Scanning, Resolving)
                | (Resolving, Registering)
                | (Registering, Active)
                | (Scanning | Resolving | Registering, Failed)
                | (Registering, ShuttingDown { rollback: true })
                | (ShuttingDown { rollback: true }, Failed)
                | (Active, ShuttingDown { rollback: false })
                | (ShuttingDown { rollback: false }, Stopped)
        )
    }

    pub fn accepts_start(self) -> bool {
        matches!(self, LifecycleState::Unstarted | LifecycleState::Stopped)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Unstarted => f.write_str("Unstarted"),
            LifecycleState::Scanning => f.write_str("Scanning"),
            LifecycleState::Resolving => f.write_str("Resolving"),
            LifecycleState::Registering => f.write_str("Registering"),
            LifecycleState::Active => f.write_str("Active"),
            LifecycleState::ShuttingDown { rollback: true } => f.write_str("ShuttingDown (rollback)"),
            LifecycleState::ShuttingDown { rollback: false } => f.write_str("ShuttingDown"),
            LifecycleState::Stopped => f.write_str("Stopped"),
            LifecycleState::Failed => f.write_str("Failed"),
        }
    }
}
