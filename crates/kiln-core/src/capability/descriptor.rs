use std::fmt;
use std::sync::Arc;

use crate::capability::CapabilityKind;
use crate::command::{ArgumentError, ArgumentResolver, Arguments, CommandHandler, Route, Segment};
use crate::config::schema::SchemaValidator;
use crate::config::{ConfigData, SchemaBinding};
use crate::error::BoxError;
use crate::event::{EventListener, EventPriority};
use crate::injection::Dependencies;

/// Builds a command handler from its resolved dependencies.
pub type CommandConstructor =
    Arc<dyn Fn(&Dependencies) -> Result<Arc<dyn CommandHandler>, BoxError> + Send + Sync>;

/// Builds an event listener from its resolved dependencies.
pub type ListenerConstructor =
    Arc<dyn Fn(&Dependencies) -> Result<Arc<dyn EventListener>, BoxError> + Send + Sync>;

/// One route of a command as the host sees it.
#[derive(Debug, Clone, Default)]
pub struct RouteMetadata {
    /// `None` passes every token through unbound
    pub route: Option<Route>,
    /// Overrides the command's permission node when set
    pub permission: Option<String>,
    pub description: Option<String>,
    /// Run on the host scheduler rather than the dispatching thread
    pub asynchronous: bool,
    pub resolvers: Vec<(String, Arc<dyn ArgumentResolver>)>,
}

impl RouteMetadata {
    pub fn new(route: Route) -> Self {
        Self {
            route: Some(route),
            ..Self::default()
        }
    }

    pub fn resolver(&self, argument: &str) -> Option<&Arc<dyn ArgumentResolver>> {
        self.resolvers
            .iter()
            .find(|(name, _)| name == argument)
            .map(|(_, resolver)| resolver)
    }

    /// Leading literal segments, which select this route among its siblings.
    pub fn literal_prefix(&self) -> Vec<&str> {
        self.route
            .as_ref()
            .map(|route| {
                route
                    .segments()
                    .iter()
                    .map_while(|segment| match segment {
                        Segment::Literal(literal) => Some(literal.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The route with argument names erased, e.g. `"give <> []"`. Two routes
    /// of one command may not share a shape.
    pub fn shape(&self) -> String {
        let Some(route) = &self.route else {
            return String::new();
        };
        route
            .segments()
            .iter()
            .map(|segment| match segment {
                Segment::Literal(literal) => literal.clone(),
                Segment::Required(_) => "<>".to_string(),
                Segment::Optional { .. } => "[]".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Binds invocation tokens to the route and runs the argument resolvers.
    ///
    /// Without a route every token is passed through unbound.
    pub fn bind(&self, tokens: &[String]) -> Result<Arguments, ArgumentError> {
        let mut arguments = match &self.route {
            Some(route) => route.bind(tokens)?,
            None => Arguments::new(tokens.to_vec()),
        };
        for (name, resolver) in &self.resolvers {
            arguments.resolve_with(name, resolver.as_ref())?;
        }
        Ok(arguments)
    }

    pub fn usage(&self, command: &str) -> String {
        match &self.route {
            Some(route) => route.usage(command),
            None => command.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandMetadata {
    /// Lower-cased, sharing the command namespace with names
    pub aliases: Vec<String>,
    pub permission: Option<String>,
    pub description: Option<String>,
    /// Routes in declaration order; a host registers one handler per route
    pub routes: Vec<RouteMetadata>,
}

impl CommandMetadata {
    /// A command with one route.
    pub fn single(route: RouteMetadata) -> Self {
        Self {
            routes: vec![route],
            ..Self::default()
        }
    }

    /// Permission node guarding route `index`.
    pub fn permission_for(&self, index: usize) -> Option<&str> {
        self.routes
            .get(index)
            .and_then(|route| route.permission.as_deref())
            .or(self.permission.as_deref())
    }

    /// Routes whose literal prefix matches the leading tokens, most specific
    /// first. Routes without literals match anything and come last.
    pub fn candidates(&self, tokens: &[String]) -> Vec<usize> {
        let mut matching: Vec<(usize, usize)> = self
            .routes
            .iter()
            .enumerate()
            .filter_map(|(index, route)| {
                let prefix = route.literal_prefix();
                let matches = prefix.len() <= tokens.len()
                    && prefix
                        .iter()
                        .zip(tokens)
                        .all(|(literal, token)| token.eq_ignore_ascii_case(literal));
                matches.then_some((index, prefix.len()))
            })
            .collect();
        matching.sort_by(|(_, a), (_, b)| b.cmp(a));
        matching.into_iter().map(|(index, _)| index).collect()
    }

    /// Usage lines of the given routes, or of every route when `indices` is
    /// empty, joined with `" | "`.
    pub fn usage(&self, command: &str, indices: &[usize]) -> String {
        let lines: Vec<String> = if indices.is_empty() {
            self.routes.iter().map(|route| route.usage(command)).collect()
        } else {
            indices
                .iter()
                .filter_map(|index| self.routes.get(*index))
                .map(|route| route.usage(command))
                .collect()
        };
        if lines.is_empty() {
            command.to_string()
        } else {
            lines.join(" | ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerMetadata {
    pub event: String,
    pub priority: EventPriority,
}

#[derive(Clone)]
pub struct SchemaMetadata {
    pub type_name: String,
    pub defaults: ConfigData,
    pub(crate) validator: SchemaValidator,
}

impl fmt::Debug for SchemaMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaMetadata")
            .field("type_name", &self.type_name)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// Kind-specific metadata paired with the author's constructor.
#[derive(Clone)]
pub(crate) enum Definition {
    Command {
        metadata: CommandMetadata,
        /// One per route, same order
        constructors: Vec<CommandConstructor>,
    },
    Listener {
        metadata: ListenerMetadata,
        constructor: ListenerConstructor,
    },
    ConfigSchema {
        metadata: SchemaMetadata,
    },
}

/// A validated capability declaration, produced by the scanner.
#[derive(Clone)]
pub struct CapabilityDescriptor {
    identity: String,
    dependencies: Vec<String>,
    source_unit: String,
    definition: Definition,
}

impl CapabilityDescriptor {
    pub(crate) fn new(
        identity: String,
        dependencies: Vec<String>,
        source_unit: String,
        definition: Definition,
    ) -> Self {
        Self {
            identity,
            dependencies,
            source_unit,
            definition,
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        match self.definition {
            Definition::Command { .. } => CapabilityKind::Command,
            Definition::Listener { .. } => CapabilityKind::Listener,
            Definition::ConfigSchema { .. } => CapabilityKind::ConfigSchema,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Dependency keys in declaration order, duplicates collapsed
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Name of the code unit that declared this capability
    pub fn source_unit(&self) -> &str {
        &self.source_unit
    }

    pub fn command_metadata(&self) -> Option<&CommandMetadata> {
        match &self.definition {
            Definition::Command { metadata, .. } => Some(metadata),
            _ => None,
        }
    }

    pub fn listener_metadata(&self) -> Option<&ListenerMetadata> {
        match &self.definition {
            Definition::Listener { metadata, .. } => Some(metadata),
            _ => None,
        }
    }

    pub fn schema_metadata(&self) -> Option<&SchemaMetadata> {
        match &self.definition {
            Definition::ConfigSchema { metadata } => Some(metadata),
            _ => None,
        }
    }

    pub(crate) fn definition(&self) -> &Definition {
        &self.definition
    }
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("kind", &self.kind())
            .field("identity", &self.identity)
            .field("dependencies", &self.dependencies)
            .field("source_unit", &self.source_unit)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' from {}", self.kind(), self.identity, self.source_unit)?;
        match &self.definition {
            Definition::Command { metadata, .. } => {
                if !metadata.aliases.is_empty() {
                    write!(f, " aliases [{}]", metadata.aliases.join(", "))?;
                }
                for route in metadata.routes.iter().filter_map(|route| route.route.as_ref()) {
                    write!(f, " route \"{}\"", route)?;
                }
            }
            Definition::Listener { metadata, .. } => {
                write!(f, " on '{}' ({})", metadata.event, metadata.priority)?;
            }
            Definition::ConfigSchema { metadata } => {
                write!(f, " backed by {}", metadata.type_name)?;
            }
        }
        if !self.dependencies.is_empty() {
            write!(f, " needs [{}]", self.dependencies.join(", "))?;
        }
        Ok(())
    }
}

/// The constructed object of a capability, paired with what the host needs
/// to register it.
#[derive(Clone)]
pub enum CapabilityObject {
    Command {
        metadata: CommandMetadata,
        /// One per route of `metadata`, same order
        handlers: Vec<Arc<dyn CommandHandler>>,
    },
    Listener {
        metadata: ListenerMetadata,
        listener: Arc<dyn EventListener>,
    },
    ConfigSchema(Arc<SchemaBinding>),
}

impl fmt::Debug for CapabilityObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityObject::Command { metadata, .. } => {
                f.debug_struct("Command").field("metadata", metadata).finish_non_exhaustive()
            }
            CapabilityObject::Listener { metadata, .. } => {
                f.debug_struct("Listener").field("metadata", metadata).finish_non_exhaustive()
            }
            CapabilityObject::ConfigSchema(binding) => f.debug_tuple("ConfigSchema").field(binding).finish(),
        }
    }
}

/// A descriptor together with its constructed object, owned by the
/// lifecycle controller for one startup pass.
#[derive(Debug, Clone)]
pub struct CapabilityInstance {
    descriptor: CapabilityDescriptor,
    object: CapabilityObject,
}

impl CapabilityInstance {
    pub(crate) fn new(descriptor: CapabilityDescriptor, object: CapabilityObject) -> Self {
        Self { descriptor, object }
    }

    pub fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    pub fn object(&self) -> &CapabilityObject {
        &self.object
    }

    pub fn kind(&self) -> CapabilityKind {
        self.descriptor.kind()
    }

    pub fn identity(&self) -> &str {
        self.descriptor.identity()
    }
}
