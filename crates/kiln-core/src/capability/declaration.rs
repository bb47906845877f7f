//! Builders plugin authors use to declare capabilities.
//!
//! ```ignore
//! let reload = Declaration::command("reload")
//!     .alias("rl")
//!     .permission("greeter.reload")
//!     .depends_on("greeter.store")
//!     .handler(|deps| {
//!         let store = deps.get::<GreetingStore>("greeter.store")?;
//!         Ok(ReloadCommand { store })
//!     });
//! ```
//!
//! A command with sub-commands carries one route per branch, each with its own
//! handler. The first literal segments pick the branch; a route without
//! literals is the command's default:
//!
//! ```ignore
//! let eco = Declaration::command("eco")
//!     .permission("eco.use")
//!     .with_route(Declaration::route("give <player> <amount>").executes(give))
//!     .with_route(Declaration::route("take <player> <amount>").permission("eco.admin").executes(take));
//! ```
//!
//! Builders never fail. Missing or malformed pieces are reported by the
//! scanner, so an incomplete declaration fails startup instead of failing at
//! its first invocation.
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::capability::descriptor::{CommandConstructor, ListenerConstructor};
use crate::capability::CapabilityKind;
use crate::command::{ArgumentResolver, Arguments, CommandHandler, CommandOutcome, Invoker};
use crate::config::schema::{validator_for, SchemaValidator};
use crate::config::ConfigData;
use crate::error::BoxError;
use crate::event::{Event, EventListener, EventPriority, EventResult};
use crate::injection::Dependencies;

/// One declared capability, as written by the plugin author.
#[derive(Clone)]
pub enum Declaration {
    Command(CommandDeclaration),
    Listener(ListenerDeclaration),
    ConfigSchema(SchemaDeclaration),
}

impl Declaration {
    pub fn command(name: impl Into<String>) -> CommandDeclaration {
        CommandDeclaration {
            name: name.into(),
            aliases: Vec::new(),
            permission: None,
            description: None,
            dependencies: Vec::new(),
            primary: RouteDeclaration::default(),
            routes: Vec::new(),
        }
    }

    /// One extra route of a command, attached with
    /// [`CommandDeclaration::with_route`].
    pub fn route(pattern: impl Into<String>) -> RouteDeclaration {
        RouteDeclaration {
            pattern: Some(pattern.into()),
            ..RouteDeclaration::default()
        }
    }

    pub fn listener(identity: impl Into<String>) -> ListenerDeclaration {
        ListenerDeclaration {
            identity: identity.into(),
            event: None,
            priority: None,
            dependencies: Vec::new(),
            constructor: None,
        }
    }

    pub fn config_schema(identity: impl Into<String>) -> SchemaDeclaration {
        SchemaDeclaration {
            identity: identity.into(),
            backing: None,
            defaults: ConfigData::new(),
            rejected_defaults: Vec::new(),
        }
    }

    /// A config schema holding a message catalog: any table of text, read
    /// with [`Dependencies::messages`]. Defaults are the built-in messages.
    pub fn messages(identity: impl Into<String>) -> SchemaDeclaration {
        Self::config_schema(identity).backed_by::<serde_json::Map<String, serde_json::Value>>()
    }

    pub fn kind(&self) -> CapabilityKind {
        match self {
            Declaration::Command(_) => CapabilityKind::Command,
            Declaration::Listener(_) => CapabilityKind::Listener,
            Declaration::ConfigSchema(_) => CapabilityKind::ConfigSchema,
        }
    }

    /// The identity as declared, before any normalization.
    pub fn identity(&self) -> &str {
        match self {
            Declaration::Command(command) => &command.name,
            Declaration::Listener(listener) => &listener.identity,
            Declaration::ConfigSchema(schema) => &schema.identity,
        }
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Command(command) => fmt::Debug::fmt(command, f),
            Declaration::Listener(listener) => fmt::Debug::fmt(listener, f),
            Declaration::ConfigSchema(schema) => fmt::Debug::fmt(schema, f),
        }
    }
}

impl From<CommandDeclaration> for Declaration {
    fn from(command: CommandDeclaration) -> Self {
        Declaration::Command(command)
    }
}

impl From<ListenerDeclaration> for Declaration {
    fn from(listener: ListenerDeclaration) -> Self {
        Declaration::Listener(listener)
    }
}

impl From<SchemaDeclaration> for Declaration {
    fn from(schema: SchemaDeclaration) -> Self {
        Declaration::ConfigSchema(schema)
    }
}

#[derive(Clone)]
pub struct CommandDeclaration {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) permission: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) dependencies: Vec<String>,
    /// Route configured directly on the command
    pub(crate) primary: RouteDeclaration,
    pub(crate) routes: Vec<RouteDeclaration>,
}

impl CommandDeclaration {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Permission node checked by the host before a handler runs. A route
    /// with its own node uses that one instead.
    pub fn permission(mut self, node: impl Into<String>) -> Self {
        self.permission = Some(node.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Route pattern for the tokens after the command name, e.g.
    /// `"give <player> <amount> [reason]"`.
    pub fn route(mut self, pattern: impl Into<String>) -> Self {
        self.primary.pattern = Some(pattern.into());
        self
    }

    /// Attaches a resolver to a route argument.
    pub fn argument<R>(mut self, name: impl Into<String>, resolver: R) -> Self
    where
        R: ArgumentResolver + 'static,
    {
        self.primary = self.primary.argument(name, resolver);
        self
    }

    /// Runs the handler on the host scheduler instead of the calling thread.
    pub fn asynchronous(mut self) -> Self {
        self.primary.asynchronous = true;
        self
    }

    /// Declares a container key the handler constructors need.
    pub fn depends_on(mut self, key: impl Into<String>) -> Self {
        self.dependencies.push(key.into());
        self
    }

    /// Sets the constructor that builds the handler from its dependencies.
    pub fn handler<F, H>(mut self, constructor: F) -> Self
    where
        F: Fn(&Dependencies) -> Result<H, BoxError> + Send + Sync + 'static,
        H: CommandHandler + 'static,
    {
        self.primary = self.primary.handler(constructor);
        self
    }

    /// Shorthand for a stateless handler without dependencies.
    pub fn executes<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invoker, &Arguments) -> CommandOutcome + Send + Sync + 'static,
    {
        self.primary = self.primary.executes(handler);
        self
    }

    /// Adds a further route with its own handler.
    pub fn with_route(mut self, route: RouteDeclaration) -> Self {
        self.routes.push(route);
        self
    }
}

impl fmt::Debug for CommandDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDeclaration")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("route", &self.primary.pattern)
            .field("routes", &self.routes)
            .field("dependencies", &self.dependencies)
            .field("has_handler", &self.primary.constructor.is_some())
            .finish_non_exhaustive()
    }
}

/// One branch of a command: a pattern, its resolvers and its handler.
#[derive(Clone, Default)]
pub struct RouteDeclaration {
    /// `None` passes every token to the handler unbound
    pub(crate) pattern: Option<String>,
    pub(crate) permission: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) asynchronous: bool,
    pub(crate) resolvers: Vec<(String, Arc<dyn ArgumentResolver>)>,
    pub(crate) dependencies: Vec<String>,
    pub(crate) constructor: Option<CommandConstructor>,
}

impl RouteDeclaration {
    /// Overrides the command's permission node for this route.
    pub fn permission(mut self, node: impl Into<String>) -> Self {
        self.permission = Some(node.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument<R>(mut self, name: impl Into<String>, resolver: R) -> Self
    where
        R: ArgumentResolver + 'static,
    {
        self.resolvers.push((name.into(), Arc::new(resolver)));
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    pub fn depends_on(mut self, key: impl Into<String>) -> Self {
        self.dependencies.push(key.into());
        self
    }

    pub fn handler<F, H>(mut self, constructor: F) -> Self
    where
        F: Fn(&Dependencies) -> Result<H, BoxError> + Send + Sync + 'static,
        H: CommandHandler + 'static,
    {
        let constructor: CommandConstructor = Arc::new(move |deps: &Dependencies| {
            constructor(deps).map(|handler| Arc::new(handler) as Arc<dyn CommandHandler>)
        });
        self.constructor = Some(constructor);
        self
    }

    pub fn executes<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invoker, &Arguments) -> CommandOutcome + Send + Sync + 'static,
    {
        let handler: Arc<dyn CommandHandler> = Arc::new(handler);
        let constructor: CommandConstructor =
            Arc::new(move |_: &Dependencies| Ok(Arc::clone(&handler)));
        self.constructor = Some(constructor);
        self
    }

    /// Whether anything beyond the defaults was configured.
    pub(crate) fn is_declared(&self) -> bool {
        self.pattern.is_some()
            || self.permission.is_some()
            || self.description.is_some()
            || self.asynchronous
            || !self.resolvers.is_empty()
            || !self.dependencies.is_empty()
            || self.constructor.is_some()
    }
}

impl fmt::Debug for RouteDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDeclaration")
            .field("pattern", &self.pattern)
            .field("permission", &self.permission)
            .field("asynchronous", &self.asynchronous)
            .field("has_handler", &self.constructor.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ListenerDeclaration {
    pub(crate) identity: String,
    pub(crate) event: Option<String>,
    pub(crate) priority: Option<EventPriority>,
    pub(crate) dependencies: Vec<String>,
    pub(crate) constructor: Option<ListenerConstructor>,
}

impl ListenerDeclaration {
    /// Event type name to subscribe to.
    pub fn on(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn priority(mut self, priority: EventPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn depends_on(mut self, key: impl Into<String>) -> Self {
        self.dependencies.push(key.into());
        self
    }

    pub fn handler<F, L>(mut self, constructor: F) -> Self
    where
        F: Fn(&Dependencies) -> Result<L, BoxError> + Send + Sync + 'static,
        L: EventListener + 'static,
    {
        let constructor: ListenerConstructor = Arc::new(move |deps: &Dependencies| {
            constructor(deps).map(|listener| Arc::new(listener) as Arc<dyn EventListener>)
        });
        self.constructor = Some(constructor);
        self
    }

    pub fn executes<F>(mut self, listener: F) -> Self
    where
        F: Fn(&dyn Event) -> EventResult + Send + Sync + 'static,
    {
        let listener: Arc<dyn EventListener> = Arc::new(listener);
        let constructor: ListenerConstructor =
            Arc::new(move |_: &Dependencies| Ok(Arc::clone(&listener)));
        self.constructor = Some(constructor);
        self
    }
}

impl fmt::Debug for ListenerDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerDeclaration")
            .field("identity", &self.identity)
            .field("event", &self.event)
            .field("priority", &self.priority)
            .field("dependencies", &self.dependencies)
            .field("has_handler", &self.constructor.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct SchemaDeclaration {
    pub(crate) identity: String,
    pub(crate) backing: Option<(String, SchemaValidator)>,
    pub(crate) defaults: ConfigData,
    /// Defaults whose value could not be serialized, reported at scan time
    pub(crate) rejected_defaults: Vec<(String, String)>,
}

impl SchemaDeclaration {
    /// The structural type the merged configuration must deserialize into.
    pub fn backed_by<T>(mut self) -> Self
    where
        T: DeserializeOwned + 'static,
    {
        self.backing = Some((std::any::type_name::<T>().to_string(), validator_for::<T>()));
        self
    }

    pub fn default<V: Serialize>(mut self, field: impl Into<String>, value: V) -> Self {
        let field = field.into();
        if let Err(err) = self.defaults.set(&field, value) {
            self.rejected_defaults.push((field, err.to_string()));
        }
        self
    }
}

impl fmt::Debug for SchemaDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDeclaration")
            .field("identity", &self.identity)
            .field("backing", &self.backing.as_ref().map(|(name, _)| name))
            .field("defaults", &self.defaults.keys())
            .finish()
    }
}
