//! # Kiln Core Commands
//!
//! The invocation vocabulary shared by command capabilities and hosts:
//! who invoked ([`Invoker`]), with which bound arguments ([`Arguments`]), and
//! what came of it ([`CommandOutcome`]).
pub mod error;
pub mod resolver;
pub mod route;

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::constants::CONSOLE_INVOKER;

pub use error::{ArgumentError, RouteError};
pub use resolver::{ArgumentResolver, PlayerDirectory, PlayerResolver};
pub use route::{Route, Segment};

/// The sender of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoker {
    name: String,
    permissions: HashSet<String>,
    console: bool,
}

impl Invoker {
    /// The server console holds every permission.
    pub fn console() -> Self {
        Self {
            name: CONSOLE_INVOKER.to_string(),
            permissions: HashSet::new(),
            console: true,
        }
    }

    pub fn player(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: HashSet::new(),
            console: false,
        }
    }

    pub fn grant(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_console(&self) -> bool {
        self.console
    }

    /// Exact nodes match, as do `*` and `prefix.*` wildcards.
    pub fn has_permission(&self, node: &str) -> bool {
        if self.console || self.permissions.contains("*") || self.permissions.contains(node) {
            return true;
        }
        self.permissions.iter().any(|granted| {
            granted
                .strip_suffix(".*")
                .is_some_and(|prefix| node.starts_with(prefix) && node[prefix.len()..].starts_with('.'))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success(Option<String>),
    Failure(String),
    /// The invoker lacks the command's permission node
    Denied { permission: String },
    /// The tokens did not fit the route; carries the usage line
    Usage(String),
    /// No command is registered under the invoked name or alias
    Unknown(String),
    /// Queued on the host scheduler; the handler's own outcome comes later
    Scheduled,
}

impl CommandOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        CommandOutcome::Success(Some(message.into()))
    }

    pub fn done() -> Self {
        CommandOutcome::Success(None)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        CommandOutcome::Failure(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success(_))
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Success(Some(message)) => f.write_str(message),
            CommandOutcome::Success(None) => f.write_str("ok"),
            CommandOutcome::Failure(message) => write!(f, "error: {}", message),
            CommandOutcome::Denied { permission } => {
                write!(f, "You do not have permission to do that ({})", permission)
            }
            CommandOutcome::Usage(usage) => write!(f, "Usage: {}", usage),
            CommandOutcome::Unknown(name) => write!(f, "Unknown command '{}'", name),
            CommandOutcome::Scheduled => f.write_str("scheduled"),
        }
    }
}

/// A constructed command object, registered with the host by the registrar.
pub trait CommandHandler: Send + Sync {
    fn execute(&self, invoker: &Invoker, arguments: &Arguments) -> CommandOutcome;
}

impl<F> CommandHandler for F
where
    F: Fn(&Invoker, &Arguments) -> CommandOutcome + Send + Sync,
{
    fn execute(&self, invoker: &Invoker, arguments: &Arguments) -> CommandOutcome {
        self(invoker, arguments)
    }
}

/// Tokens of one invocation plus the values bound to route arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    raw: Vec<String>,
    named: HashMap<String, String>,
}

impl Arguments {
    pub fn new(raw: Vec<String>) -> Self {
        Self {
            raw,
            named: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: &str, value: String) {
        self.named.insert(name.to_string(), value);
    }

    /// All tokens after the command name, unbound
    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    pub fn get<T: FromArgument>(&self, name: &str) -> Result<T, ArgumentError> {
        self.get_opt(name)?
            .ok_or_else(|| ArgumentError::Missing { name: name.to_string() })
    }

    /// `Ok(None)` for an unset optional argument.
    pub fn get_opt<T: FromArgument>(&self, name: &str) -> Result<Option<T>, ArgumentError> {
        let Some(value) = self.named.get(name) else {
            return Ok(None);
        };
        T::from_argument(value)
            .map(Some)
            .ok_or_else(|| ArgumentError::Invalid {
                name: name.to_string(),
                value: value.clone(),
                expected: T::EXPECTED.to_string(),
            })
    }

    /// Runs `resolver` over the value bound to `name`, replacing it with the
    /// normalized form. Unset arguments are left alone.
    pub(crate) fn resolve_with(
        &mut self,
        name: &str,
        resolver: &dyn ArgumentResolver,
    ) -> Result<(), ArgumentError> {
        let Some(value) = self.named.get_mut(name) else {
            return Ok(());
        };
        match resolver.resolve(value) {
            Some(resolved) => {
                *value = resolved;
                Ok(())
            }
            None => Err(ArgumentError::Invalid {
                name: name.to_string(),
                value: value.clone(),
                expected: resolver.type_name().to_string(),
            }),
        }
    }
}

/// Conversion from a bound argument value.
pub trait FromArgument: Sized {
    const EXPECTED: &'static str;

    fn from_argument(value: &str) -> Option<Self>;
}

impl FromArgument for String {
    const EXPECTED: &'static str = "text";

    fn from_argument(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}

impl FromArgument for bool {
    const EXPECTED: &'static str = "true or false";

    fn from_argument(value: &str) -> Option<Self> {
        resolver::parse_bool(value)
    }
}

macro_rules! parsed_argument {
    ($($ty:ty => $expected:literal),* $(,)?) => {
        $(
            impl FromArgument for $ty {
                const EXPECTED: &'static str = $expected;

                fn from_argument(value: &str) -> Option<Self> {
                    value.trim().parse().ok()
                }
            }
        )*
    };
}

parsed_argument! {
    i32 => "an integer",
    i64 => "an integer",
    u32 => "a non-negative integer",
    u64 => "a non-negative integer",
    usize => "a non-negative integer",
    f64 => "a number",
}
