//! The demo host: runs the greeter plugin against a [`MemoryHost`].
use std::path::PathBuf;
use std::sync::Arc;

use kiln_core::event::ServerEvent;
use greeter::GreeterPlugin;
use kiln_core::{ConfigData, Error, Event, Invoker, KilnPlugin, LifecycleController, MemoryHost, Result, Scanner};
use log::info;

/// Commands the host keeps for itself.
const SERVER_COMMANDS: [&str; 3] = ["help", "stop", "reload"];

#[derive(Debug, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub invoke: Vec<String>,
    pub emit: Vec<String>,
    pub player: Option<String>,
    pub grant: Vec<String>,
}

impl RunOptions {
    fn invoker(&self) -> Invoker {
        match &self.player {
            Some(name) => self
                .grant
                .iter()
                .fold(Invoker::player(name.as_str()), |invoker, permission| invoker.grant(permission.as_str())),
            None => Invoker::console(),
        }
    }
}

/// Starts the plugin, dispatches `--invoke` lines, runs whatever they
/// scheduled, publishes `--emit` events, then stops the plugin.
pub fn run(options: &RunOptions) -> Result<()> {
    let config = match &options.config {
        Some(path) => ConfigData::load(path)?,
        None => ConfigData::new(),
    };

    let host = Arc::new(MemoryHost::with_reserved_commands(SERVER_COMMANDS));
    let mut controller = LifecycleController::new(host.clone());
    let ctx = GreeterPlugin::new().context(config)?;

    let report = controller.start(&ctx);
    print!("{}", report);
    report.into_result()?;

    let invoker = options.invoker();
    for line in &options.invoke {
        println!("{}> {}", invoker.name(), line);
        println!("{}", host.dispatch(&invoker, line));
    }
    for (command, outcome) in host.run_scheduled() {
        println!("{} (scheduled)> {}", command, outcome);
    }

    for raw in &options.emit {
        let event = parse_event(raw)?;
        info!("Publishing {}", raw);
        let result = host.publish(&event);
        println!("event {}: {:?}", event.name(), result);
    }

    let shutdown = controller.stop();
    print!("{}", shutdown);
    Ok(())
}

/// Prints every descriptor of the greeter plugin, or its scan errors.
pub fn scan() -> Result<()> {
    let units = GreeterPlugin::new().code_units();
    let outcome = Scanner::new().scan(&units).finish();

    for descriptor in &outcome.descriptors {
        println!("{}", descriptor);
    }
    for error in &outcome.errors {
        eprintln!("{}", error);
    }

    match outcome.errors.len() {
        0 => Ok(()),
        n => Err(Error::other(format!("{} invalid declaration(s)", n))),
    }
}

/// Parses `NAME` or `NAME:key=value,key=value`.
pub fn parse_event(raw: &str) -> Result<ServerEvent> {
    let (name, fields) = match raw.split_once(':') {
        Some((name, fields)) => (name.trim(), fields),
        None => (raw.trim(), ""),
    };
    if name.is_empty() {
        return Err(Error::other(format!("event '{}' has no name", raw)));
    }

    let mut event = ServerEvent::new(name);
    for field in fields.split(',').filter(|field| !field.trim().is_empty()) {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| Error::other(format!("event field '{}' is not key=value", field)))?;
        event = event.with(key.trim(), value.trim());
    }
    Ok(event)
}
