//! # Kiln Core Capabilities
//!
//! The closed set of things a plugin can declare: commands, event listeners
//! and configuration schemas.
//!
//! Authors build [`Declaration`]s with the builders in [`declaration`]. The
//! scanner validates them into immutable [`CapabilityDescriptor`]s, and the
//! resolver turns each descriptor into a [`CapabilityInstance`] ready for
//! registration.
pub mod declaration;
pub mod descriptor;

use std::fmt;

pub use declaration::{CommandDeclaration, Declaration, ListenerDeclaration, RouteDeclaration, SchemaDeclaration};
pub use descriptor::{
    CapabilityDescriptor, CapabilityInstance, CapabilityObject, CommandConstructor, CommandMetadata,
    ListenerConstructor, ListenerMetadata, RouteMetadata, SchemaMetadata,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    ConfigSchema,
    Listener,
    Command,
}

impl CapabilityKind {
    /// Position in the registration order: schemas, then listeners, then commands.
    pub fn registration_rank(&self) -> u8 {
        match self {
            CapabilityKind::ConfigSchema => 0,
            CapabilityKind::Listener => 1,
            CapabilityKind::Command => 2,
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapabilityKind::ConfigSchema => "config schema",
            CapabilityKind::Listener => "listener",
            CapabilityKind::Command => "command",
        };
        f.write_str(name)
    }
}
