//! # Kiln Core Host Contract
//!
//! The registries a host server exposes to the engine. The registrar is the
//! only caller of [`Host`]; everything else in a host (command dispatch, the
//! event bus, config lookups) stays on the host's side of the line.
pub mod memory;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::capability::{CommandMetadata, ListenerMetadata};
use crate::command::CommandHandler;
use crate::config::SchemaBinding;
use crate::event::EventListener;

pub use memory::MemoryHost;

/// Host-side handle for one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u64);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("'{name}' is already registered by '{owner}'")]
    NameCollision { name: String, owner: String },

    #[error("Host rejected the registration: {reason}")]
    Rejected { reason: String },

    #[error("Host registry is unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Registries of the host server.
///
/// Every `register_*` call performs exactly one host mutation or none.
/// `unregister_*` calls are idempotent: an unknown or already released slot
/// is not an error.
pub trait Host: Send + Sync {
    /// Adds `name` and the aliases in `metadata` to the command table.
    ///
    /// `handlers` holds one handler per entry of `metadata.routes`, in the
    /// same order. Fails with [`HostError::NameCollision`] when any label is
    /// already taken.
    fn register_command(
        &self,
        owner: &str,
        name: &str,
        metadata: &CommandMetadata,
        handlers: &[Arc<dyn CommandHandler>],
    ) -> Result<SlotId, HostError>;

    /// Subscribes `listener` to the event type named in `metadata`.
    fn register_listener(
        &self,
        owner: &str,
        identity: &str,
        metadata: &ListenerMetadata,
        listener: Arc<dyn EventListener>,
    ) -> Result<SlotId, HostError>;

    /// Publishes a bound configuration section under its identity, scoped
    /// to `owner`.
    fn register_config_schema(&self, owner: &str, binding: Arc<SchemaBinding>) -> Result<SlotId, HostError>;

    /// Releases every label of the command held in `slot`.
    fn unregister_command(&self, slot: SlotId) -> Result<(), HostError>;

    /// Detaches the listener held in `slot` from the event bus.
    fn unregister_listener(&self, slot: SlotId) -> Result<(), HostError>;

    /// Withdraws the configuration section held in `slot`.
    fn unregister_config_schema(&self, slot: SlotId) -> Result<(), HostError>;
}
