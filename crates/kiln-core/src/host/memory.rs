//! In-memory reference host.
//!
//! [`MemoryHost`] keeps a command table, an event bus and a config store in
//! plain maps. It backs the demo binary and the engine's tests, and shows
//! what a real server adapter has to provide.
//!
//! Routes flagged asynchronous are queued on a scheduler instead of running
//! during dispatch; [`MemoryHost::run_scheduled`] is the scheduler tick.
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::capability::{CommandMetadata, ListenerMetadata, RouteMetadata};
use crate::command::resolver::{complete, PlayerDirectory};
use crate::command::{Arguments, CommandHandler, CommandOutcome, Invoker, Segment};
use crate::config::SchemaBinding;
use crate::constants::MAX_SUGGESTIONS;
use crate::event::{Event, EventListener, EventResult};
use crate::host::{Host, HostError, SlotId};

/// Owner reported for names reserved by the server itself.
const SERVER_OWNER: &str = "server";

struct CommandEntry {
    owner: String,
    name: String,
    metadata: Arc<CommandMetadata>,
    /// One per route
    handlers: Vec<Arc<dyn CommandHandler>>,
}

/// An asynchronous invocation waiting for the scheduler.
struct ScheduledRun {
    command: String,
    invoker: Invoker,
    arguments: Arguments,
    handler: Arc<dyn CommandHandler>,
}

struct ListenerEntry {
    owner: String,
    metadata: ListenerMetadata,
    listener: Arc<dyn EventListener>,
}

struct SchemaEntry {
    owner: String,
    binding: Arc<SchemaBinding>,
}

#[derive(Default)]
struct Tables {
    next_slot: u64,
    reserved: HashSet<String>,
    commands: HashMap<SlotId, CommandEntry>,
    /// Command names and aliases
    labels: HashMap<String, SlotId>,
    listeners: HashMap<SlotId, ListenerEntry>,
    schemas: HashMap<SlotId, SchemaEntry>,
    scheduled: VecDeque<ScheduledRun>,
    players: BTreeSet<String>,
}

impl Tables {
    fn allocate(&mut self) -> SlotId {
        self.next_slot += 1;
        SlotId(self.next_slot)
    }

    fn label_owner(&self, label: &str) -> Option<&str> {
        if self.reserved.contains(label) {
            return Some(SERVER_OWNER);
        }
        self.labels
            .get(label)
            .and_then(|slot| self.commands.get(slot))
            .map(|entry| entry.owner.as_str())
    }

    fn command(&self, label: &str) -> Option<&CommandEntry> {
        self.labels.get(label).and_then(|slot| self.commands.get(slot))
    }
}

#[derive(Default)]
pub struct MemoryHost {
    tables: Mutex<Tables>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose own commands cannot be taken by plugins.
    pub fn with_reserved_commands<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let host = Self::new();
        host.lock()
            .reserved
            .extend(names.into_iter().map(|name| name.as_ref().to_lowercase()));
        host
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn try_lock(&self) -> Result<MutexGuard<'_, Tables>, HostError> {
        self.tables.lock().map_err(|_| HostError::Unavailable {
            reason: "a registry lock was poisoned".to_string(),
        })
    }

    /// Runs a command line such as `"greet alex 2"` for `invoker`.
    pub fn dispatch(&self, invoker: &Invoker, line: &str) -> CommandOutcome {
        let mut tokens = line.split_whitespace().map(str::to_string);
        let Some(label) = tokens.next() else {
            return CommandOutcome::Unknown(String::new());
        };
        let arguments: Vec<String> = tokens.collect();
        self.execute(invoker, &label, &arguments)
    }

    /// Runs the command registered under `label` (name or alias).
    ///
    /// The route is picked by its leading literals; among routes sharing a
    /// prefix the first one the tokens bind to wins. Routes the invoker may
    /// not use are never picked. An asynchronous route is queued and answers
    /// [`CommandOutcome::Scheduled`].
    pub fn execute(&self, invoker: &Invoker, label: &str, tokens: &[String]) -> CommandOutcome {
        let label = label.trim_start_matches('/').to_lowercase();
        let found = {
            let tables = self.lock();
            tables
                .command(&label)
                .map(|entry| (entry.name.clone(), Arc::clone(&entry.metadata), entry.handlers.clone()))
        };
        let Some((name, metadata, handlers)) = found else {
            return CommandOutcome::Unknown(label);
        };

        let candidates = metadata.candidates(tokens);
        if candidates.is_empty() {
            log::debug!("/{} has no route for {:?}", name, tokens);
            return CommandOutcome::Usage(metadata.usage(&name, &[]));
        }

        let permitted: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|index| {
                metadata
                    .permission_for(*index)
                    .is_none_or(|permission| invoker.has_permission(permission))
            })
            .collect();
        if permitted.is_empty() {
            let permission = metadata.permission_for(candidates[0]).unwrap_or_default().to_string();
            log::debug!("{} lacks '{}' for /{}", invoker.name(), permission, name);
            return CommandOutcome::Denied { permission };
        }

        for index in &permitted {
            let (Some(route), Some(handler)) = (metadata.routes.get(*index), handlers.get(*index)) else {
                continue;
            };
            match route.bind(tokens) {
                Ok(arguments) if route.asynchronous => {
                    log::debug!("Scheduled /{} for {}", name, invoker.name());
                    self.lock().scheduled.push_back(ScheduledRun {
                        command: name,
                        invoker: invoker.clone(),
                        arguments,
                        handler: Arc::clone(handler),
                    });
                    return CommandOutcome::Scheduled;
                }
                Ok(arguments) => return handler.execute(invoker, &arguments),
                Err(err) => log::debug!("/{} rejected its arguments: {}", name, err),
            }
        }
        CommandOutcome::Usage(metadata.usage(&name, &permitted))
    }

    /// Runs every queued asynchronous invocation, oldest first, and returns
    /// each command name with its outcome.
    pub fn run_scheduled(&self) -> Vec<(String, CommandOutcome)> {
        let queued = std::mem::take(&mut self.lock().scheduled);
        queued
            .into_iter()
            .map(|run| {
                let outcome = run.handler.execute(&run.invoker, &run.arguments);
                (run.command, outcome)
            })
            .collect()
    }

    pub fn scheduled_count(&self) -> usize {
        self.lock().scheduled.len()
    }

    /// Completions for the last token of a partial command line.
    ///
    /// Arguments whose resolver offers nothing complete to a `<name>`
    /// placeholder. Every route the invoker may use contributes.
    pub fn suggest(&self, invoker: &Invoker, line: &str) -> Vec<String> {
        let mut tokens: Vec<&str> = line.split_whitespace().collect();
        let current = if line.is_empty() || line.ends_with(char::is_whitespace) {
            ""
        } else {
            tokens.pop().unwrap_or_default()
        };

        let Some(label) = tokens.first() else {
            let tables = self.lock();
            let mut visible: Vec<&str> = tables
                .labels
                .iter()
                .filter(|(_, slot)| {
                    tables
                        .commands
                        .get(*slot)
                        .is_some_and(|entry| usable_routes(&entry.metadata, invoker).next().is_some())
                })
                .map(|(label, _)| label.as_str())
                .collect();
            visible.sort_unstable();
            return complete(visible, current);
        };

        // Resolvers may call back into this host, so the tables stay unlocked.
        let metadata = {
            let tables = self.lock();
            tables.command(&label.to_lowercase()).map(|entry| Arc::clone(&entry.metadata))
        };
        let Some(metadata) = metadata else {
            return Vec::new();
        };
        let typed = &tokens[1..];
        let position = typed.len();

        let mut suggestions: Vec<String> = Vec::new();
        for route in usable_routes(&metadata, invoker) {
            let Some(pattern) = &route.route else {
                continue;
            };
            let segments = pattern.segments();
            let on_path = segments.iter().zip(typed).all(|(segment, token)| match segment {
                Segment::Literal(literal) => token.eq_ignore_ascii_case(literal),
                _ => true,
            });
            if !on_path {
                continue;
            }
            let offered = match segments.get(position) {
                None => Vec::new(),
                Some(Segment::Literal(literal)) => complete([literal.as_str()], current),
                Some(segment) => {
                    let name = segment.argument_name().unwrap_or_default();
                    let offered = route
                        .resolver(name)
                        .map(|resolver| resolver.suggestions(current))
                        .unwrap_or_default();
                    if offered.is_empty() {
                        vec![format!("<{}>", name)]
                    } else {
                        offered
                    }
                }
            };
            for suggestion in offered {
                if !suggestions.contains(&suggestion) {
                    suggestions.push(suggestion);
                }
            }
        }
        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }

    /// Marks `name` as a player the server knows about.
    pub fn add_player(&self, name: impl Into<String>) {
        self.lock().players.insert(name.into());
    }

    pub fn remove_player(&self, name: &str) {
        self.lock().players.remove(name);
    }

    /// Notifies listeners of `event`, highest priority first, registration
    /// order within a priority. A listener returning `Stop` ends propagation.
    pub fn publish(&self, event: &dyn Event) -> EventResult {
        let listeners: Vec<Arc<dyn EventListener>> = {
            let tables = self.lock();
            let mut matching: Vec<(&SlotId, &ListenerEntry)> = tables
                .listeners
                .iter()
                .filter(|(_, entry)| entry.metadata.event == event.name())
                .collect();
            matching.sort_by(|(a_slot, a), (b_slot, b)| {
                b.metadata
                    .priority
                    .cmp(&a.metadata.priority)
                    .then_with(|| a_slot.cmp(b_slot))
            });
            matching
                .into_iter()
                .map(|(_, entry)| Arc::clone(&entry.listener))
                .collect()
        };

        for listener in listeners {
            if listener.on_event(event) == EventResult::Stop {
                return EventResult::Stop;
            }
        }
        EventResult::Continue
    }

    pub fn config(&self, owner: &str, identity: &str) -> Option<Arc<SchemaBinding>> {
        self.lock()
            .schemas
            .values()
            .find(|entry| entry.owner == owner && entry.binding.identity() == identity)
            .map(|entry| Arc::clone(&entry.binding))
    }

    /// Registered command names (not aliases), sorted.
    pub fn commands(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().commands.values().map(|entry| entry.name.clone()).collect();
        names.sort();
        names
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.lock()
            .listeners
            .values()
            .filter(|entry| entry.metadata.event == event)
            .count()
    }

    /// Live registrations of every kind held for `owner`.
    pub fn registrations_of(&self, owner: &str) -> usize {
        let tables = self.lock();
        tables.commands.values().filter(|entry| entry.owner == owner).count()
            + tables.listeners.values().filter(|entry| entry.owner == owner).count()
            + tables.schemas.values().filter(|entry| entry.owner == owner).count()
    }

    pub fn registration_count(&self) -> usize {
        let tables = self.lock();
        tables.commands.len() + tables.listeners.len() + tables.schemas.len()
    }
}

impl Host for MemoryHost {
    fn register_command(
        &self,
        owner: &str,
        name: &str,
        metadata: &CommandMetadata,
        handlers: &[Arc<dyn CommandHandler>],
    ) -> Result<SlotId, HostError> {
        if metadata.routes.is_empty() || metadata.routes.len() != handlers.len() {
            return Err(HostError::Rejected {
                reason: format!(
                    "command '{}' has {} route(s) but {} handler(s)",
                    name,
                    metadata.routes.len(),
                    handlers.len()
                ),
            });
        }

        let mut tables = self.try_lock()?;
        let labels: Vec<String> = std::iter::once(name.to_lowercase())
            .chain(metadata.aliases.iter().map(|alias| alias.to_lowercase()))
            .collect();

        for label in &labels {
            if let Some(existing) = tables.label_owner(label) {
                return Err(HostError::NameCollision {
                    name: label.clone(),
                    owner: existing.to_string(),
                });
            }
        }

        let slot = tables.allocate();
        for label in labels {
            tables.labels.insert(label, slot);
        }
        tables.commands.insert(
            slot,
            CommandEntry {
                owner: owner.to_string(),
                name: name.to_lowercase(),
                metadata: Arc::new(metadata.clone()),
                handlers: handlers.to_vec(),
            },
        );
        Ok(slot)
    }

    fn register_listener(
        &self,
        owner: &str,
        _identity: &str,
        metadata: &ListenerMetadata,
        listener: Arc<dyn EventListener>,
    ) -> Result<SlotId, HostError> {
        let mut tables = self.try_lock()?;
        let slot = tables.allocate();
        tables.listeners.insert(
            slot,
            ListenerEntry {
                owner: owner.to_string(),
                metadata: metadata.clone(),
                listener,
            },
        );
        Ok(slot)
    }

    fn register_config_schema(&self, owner: &str, binding: Arc<SchemaBinding>) -> Result<SlotId, HostError> {
        let mut tables = self.try_lock()?;
        let taken = tables
            .schemas
            .values()
            .any(|entry| entry.owner == owner && entry.binding.identity() == binding.identity());
        if taken {
            return Err(HostError::NameCollision {
                name: binding.identity().to_string(),
                owner: owner.to_string(),
            });
        }
        let slot = tables.allocate();
        tables.schemas.insert(
            slot,
            SchemaEntry {
                owner: owner.to_string(),
                binding,
            },
        );
        Ok(slot)
    }

    fn unregister_command(&self, slot: SlotId) -> Result<(), HostError> {
        let mut tables = self.try_lock()?;
        if tables.commands.remove(&slot).is_some() {
            tables.labels.retain(|_, registered| *registered != slot);
        }
        Ok(())
    }

    fn unregister_listener(&self, slot: SlotId) -> Result<(), HostError> {
        self.try_lock()?.listeners.remove(&slot);
        Ok(())
    }

    fn unregister_config_schema(&self, slot: SlotId) -> Result<(), HostError> {
        self.try_lock()?.schemas.remove(&slot);
        Ok(())
    }
}

impl PlayerDirectory for MemoryHost {
    fn known_players(&self) -> Vec<String> {
        self.lock().players.iter().cloned().collect()
    }
}

/// Routes of `metadata` whose permission `invoker` holds.
fn usable_routes<'a>(
    metadata: &'a CommandMetadata,
    invoker: &'a Invoker,
) -> impl Iterator<Item = &'a RouteMetadata> + 'a {
    metadata
        .routes
        .iter()
        .enumerate()
        .filter(move |(index, _)| {
            metadata
                .permission_for(*index)
                .is_none_or(|permission| invoker.has_permission(permission))
        })
        .map(|(_, route)| route)
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.lock();
        f.debug_struct("MemoryHost")
            .field("commands", &tables.commands.len())
            .field("listeners", &tables.listeners.len())
            .field("schemas", &tables.schemas.len())
            .finish()
    }
}
