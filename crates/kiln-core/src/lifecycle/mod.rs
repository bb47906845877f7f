//! # Kiln Core Lifecycle
//!
//! The two-phase plugin lifecycle. A startup pass scans the plugin's code
//! units, resolves every descriptor against the container and the plugin's
//! configuration, then registers the instances with the host in a fixed
//! order: config schemas, listeners, commands. Either every capability ends
//! up registered or none does; a refused registration rolls the pass back in
//! reverse order. Shutdown unregisters in reverse order on a best-effort basis.
//!
//! ```text
//! Unstarted ─▶ Scanning ─▶ Resolving ─▶ Registering ─▶ Active
//!    ▲            │            │            │             │
//!    │            ▼            ▼            ▼             ▼
//!    │          Failed ◀──────────── ShuttingDown  ShuttingDown
//!    │                               (rollback)           │
//! Stopped ◀───────────────────────────────────────────────┘
//! ```
pub mod context;
pub mod controller;
pub mod error;
pub mod report;
pub mod state;

pub use context::PluginContext;
pub use controller::LifecycleController;
pub use error::StartupFailure;
pub use report::{CapabilityOutcome, OutcomeStatus, ShutdownReport, StartupReport};
pub use state::LifecycleState;
