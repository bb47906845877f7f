//! # Kiln Core
//!
//! Discovery and registration lifecycle engine for server plugins.
//!
//! A plugin implements [`plugin::KilnPlugin`] and groups its capability
//! declarations (commands, event listeners and configuration schemas) into
//! [`scanner::CodeUnit`]s. At startup the
//! [`lifecycle::LifecycleController`] scans them, resolves their dependencies
//! through an [`injection::Container`], and registers the resulting objects
//! with a [`host::Host`]. Startup is all-or-nothing: a registration failure
//! unwinds everything registered in the same pass. Shutdown unregisters in
//! reverse order.
pub mod capability;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod host;
pub mod injection;
pub mod lifecycle;
pub mod plugin;
pub mod registrar;
pub mod scanner;
pub mod version;

// Re-export the types a plugin author or host touches most often.
pub use capability::{CapabilityDescriptor, CapabilityKind, Declaration};
pub use command::{Arguments, CommandHandler, CommandOutcome, Invoker};
pub use config::{ConfigData, ConfigSource, SchemaBinding};
pub use error::{Error, Result};
pub use event::{Event, EventListener, EventPriority, EventResult};
pub use host::{Host, MemoryHost, SlotId};
pub use injection::{Container, Dependencies, Injector};
pub use lifecycle::{LifecycleController, LifecycleState, PluginContext, ShutdownReport, StartupReport};
pub use plugin::KilnPlugin;
pub use scanner::{CodeUnit, CodeUnitSource, Scanner};

#[cfg(test)]
mod tests;
