//! Greeter: the reference Kiln plugin.
//!
//! Declares two config schemas (`greeter` and its `greeter_messages`
//! catalog), one listener (`welcome`) and two commands (`greet`, `history`).
//! The commands and the listener share a [`GreetLog`] service provided by the
//! container under [`LOG_SERVICE`]. `history clear` runs on the host's
//! scheduler instead of the dispatching thread.
use std::sync::{Arc, Mutex};

use kiln_core::command::resolver::{IntegerResolver, TextResolver};
use kiln_core::config::MessageCatalog;
use kiln_core::error::BoxError;
use kiln_core::event::ServerEvent;
use kiln_core::version::VersionRange;
use kiln_core::{
    Arguments, CodeUnit, CommandHandler, CommandOutcome, Declaration, Dependencies, Event, EventListener,
    EventPriority, EventResult, Injector, Invoker, KilnPlugin,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const PLUGIN_NAME: &str = "greeter";
pub const MESSAGES: &str = "greeter_messages";
pub const LOG_SERVICE: &str = "greeter.log";
pub const JOIN_EVENT: &str = "player.join";
pub const HISTORY_PERMISSION: &str = "greeter.history";
pub const CLEAR_PERMISSION: &str = "greeter.history.clear";
/// Hard cap on `max_times`, whatever the configuration says.
pub const MAX_GREETINGS: u32 = 10;

/// Built-in message templates, keyed inside the [`MESSAGES`] section.
const DEFAULT_MESSAGES: [(&str, &str); 4] = [
    ("greet", "{greeting}, {name}!"),
    ("history.empty", "Nobody has been greeted yet"),
    ("history.list", "Greeted: {names}"),
    ("history.cleared", "Forgot {count} greeting(s)"),
];

/// The `greeter` configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreeterConfig {
    pub greeting: String,
    /// Upper bound for `greet <name> [times]`
    pub max_times: u32,
    pub welcome_players: bool,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello".to_string(),
            max_times: 3,
            welcome_players: true,
        }
    }
}

/// Names greeted so far, oldest first.
#[derive(Debug, Default)]
pub struct GreetLog {
    entries: Mutex<Vec<String>>,
}

impl GreetLog {
    pub fn record(&self, name: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push(name.to_string());
    }

    /// Empties the log, returning how many entries it held.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

struct GreetCommand {
    log: Arc<GreetLog>,
    config: GreeterConfig,
    messages: MessageCatalog,
}

impl CommandHandler for GreetCommand {
    fn execute(&self, _invoker: &Invoker, args: &Arguments) -> CommandOutcome {
        let (name, times) = match (args.get::<String>("name"), args.get::<u32>("times")) {
            (Ok(name), Ok(times)) => (name, times),
            (Err(err), _) | (_, Err(err)) => return CommandOutcome::failure(err.to_string()),
        };
        if times == 0 || times > self.config.max_times {
            return CommandOutcome::failure(format!(
                "times must be between 1 and {}",
                self.config.max_times
            ));
        }

        self.log.record(&name);
        let line = self.messages.format(
            "greet",
            [("greeting", self.config.greeting.as_str()), ("name", name.as_str())],
        );
        CommandOutcome::success(vec![line; times as usize].join(" "))
    }
}

struct HistoryCommand {
    log: Arc<GreetLog>,
    messages: MessageCatalog,
}

impl CommandHandler for HistoryCommand {
    fn execute(&self, _invoker: &Invoker, _args: &Arguments) -> CommandOutcome {
        let entries = self.log.entries();
        if entries.is_empty() {
            CommandOutcome::success(self.messages.raw("history.empty"))
        } else {
            CommandOutcome::success(
                self.messages
                    .format("history.list", [("names", entries.join(", "))]),
            )
        }
    }
}

struct ClearHistoryCommand {
    log: Arc<GreetLog>,
    messages: MessageCatalog,
}

impl CommandHandler for ClearHistoryCommand {
    fn execute(&self, invoker: &Invoker, _args: &Arguments) -> CommandOutcome {
        let count = self.log.clear();
        debug!("{} cleared {} greeting(s)", invoker.name(), count);
        CommandOutcome::success(self.messages.format("history.cleared", [("count", count)]))
    }
}

struct WelcomeListener {
    log: Arc<GreetLog>,
    enabled: bool,
}

impl EventListener for WelcomeListener {
    fn on_event(&self, event: &dyn Event) -> EventResult {
        if !self.enabled {
            return EventResult::Continue;
        }
        let player = event
            .as_any()
            .downcast_ref::<ServerEvent>()
            .and_then(|event| event.field::<String>("player"));
        if let Some(player) = player {
            debug!("Welcoming {}", player);
            self.log.record(&player);
        }
        EventResult::Continue
    }
}

/// Reads the `greeter` section, holding `max_times` to [`MAX_GREETINGS`].
fn greeter_config(deps: &Dependencies) -> std::result::Result<GreeterConfig, BoxError> {
    let mut config = deps.config(PLUGIN_NAME)?.deserialize::<GreeterConfig>()?;
    if config.max_times > MAX_GREETINGS {
        warn!(
            "greeter.max_times {} is above the limit, using {}",
            config.max_times, MAX_GREETINGS
        );
        config.max_times = MAX_GREETINGS;
    }
    Ok(config)
}

/// The reference plugin.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreeterPlugin;

impl GreeterPlugin {
    pub fn new() -> Self {
        GreeterPlugin
    }
}

impl KilnPlugin for GreeterPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn compatible_api_versions(&self) -> Vec<VersionRange> {
        const COMPATIBLE_API_REQ: &str = "^0.1";
        match VersionRange::from_constraint(COMPATIBLE_API_REQ) {
            Ok(range) => vec![range],
            Err(err) => {
                log::error!("Failed to parse API version requirement ('{}'): {}", COMPATIBLE_API_REQ, err);
                Vec::new()
            }
        }
    }

    /// The plugin's declarations, grouped the way the plugin's modules would be.
    fn code_units(&self) -> Vec<CodeUnit> {
        let defaults = GreeterConfig::default();
        let messages = DEFAULT_MESSAGES
            .iter()
            .fold(Declaration::messages(MESSAGES), |schema, (key, text)| schema.default(*key, *text));

        vec![
            CodeUnit::new("greeter::commands")
                .declare(
                    Declaration::command("greet")
                        .description("Greets a player one or more times")
                        .route("<name> [times=1]")
                        .argument("name", TextResolver)
                        .argument("times", IntegerResolver)
                        .depends_on(LOG_SERVICE)
                        .depends_on(format!("config:{}", PLUGIN_NAME))
                        .depends_on(format!("config:{}", MESSAGES))
                        .handler(|deps: &Dependencies| {
                            Ok(GreetCommand {
                                log: deps.get::<GreetLog>(LOG_SERVICE)?,
                                config: greeter_config(deps)?,
                                messages: deps.messages(MESSAGES)?,
                            })
                        }),
                )
                .declare(
                    Declaration::command("history")
                        .alias("hist")
                        .permission(HISTORY_PERMISSION)
                        .description("Lists everyone greeted so far")
                        .depends_on(LOG_SERVICE)
                        .depends_on(format!("config:{}", MESSAGES))
                        .handler(|deps: &Dependencies| {
                            Ok(HistoryCommand {
                                log: deps.get::<GreetLog>(LOG_SERVICE)?,
                                messages: deps.messages(MESSAGES)?,
                            })
                        })
                        .with_route(
                            Declaration::route("clear")
                                .permission(CLEAR_PERMISSION)
                                .description("Forgets everyone greeted so far")
                                .asynchronous()
                                .handler(|deps: &Dependencies| {
                                    Ok(ClearHistoryCommand {
                                        log: deps.get::<GreetLog>(LOG_SERVICE)?,
                                        messages: deps.messages(MESSAGES)?,
                                    })
                                }),
                        ),
                ),
            CodeUnit::new("greeter::events").declare(
                Declaration::listener("welcome")
                    .on(JOIN_EVENT)
                    .priority(EventPriority::High)
                    .depends_on(LOG_SERVICE)
                    .depends_on(format!("config:{}", PLUGIN_NAME))
                    .handler(|deps: &Dependencies| {
                        Ok(WelcomeListener {
                            log: deps.get::<GreetLog>(LOG_SERVICE)?,
                            enabled: greeter_config(deps)?.welcome_players,
                        })
                    }),
            ),
            CodeUnit::new("greeter::config")
                .declare(
                    Declaration::config_schema(PLUGIN_NAME)
                        .backed_by::<GreeterConfig>()
                        .default("greeting", defaults.greeting)
                        .default("max_times", defaults.max_times)
                        .default("welcome_players", defaults.welcome_players),
                )
                .declare(messages),
        ]
    }

    fn bind_services(&self, injector: &mut Injector) {
        injector.bind_provider(LOG_SERVICE, &[], |_: &Dependencies| Ok(GreetLog::default()));
    }
}
