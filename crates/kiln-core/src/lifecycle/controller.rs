use std::sync::Arc;

use crate::capability::CapabilityInstance;
use crate::host::Host;
use crate::injection::Resolver;
use crate::lifecycle::error::StartupFailure;
use crate::lifecycle::report::{CapabilityOutcome, OutcomeStatus, ShutdownReport, StartupReport};
use crate::lifecycle::{LifecycleState, PluginContext};
use crate::registrar::{
    Registrar, RegistrationError, RegistrationHandle, RegistrationLedger, UnregistrationWarning,
};
use crate::scanner::Scanner;
use crate::version::{api_version, is_api_compatible};

/// Drives one plugin through scan, resolve and register, and back out again.
///
/// The controller owns the ledger of live registrations. `start` and `stop`
/// take `&mut self`, so passes on one controller never overlap.
pub struct LifecycleController {
    host: Arc<dyn Host>,
    scanner: Scanner,
    state: LifecycleState,
    plugin: Option<String>,
    ledger: RegistrationLedger,
}

impl LifecycleController {
    /// A controller in `Unstarted` that registers into `host`.
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            scanner: Scanner::new(),
            state: LifecycleState::Unstarted,
            plugin: None,
            ledger: RegistrationLedger::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Plugin of the most recent accepted start.
    pub fn plugin(&self) -> Option<&str> {
        self.plugin.as_deref()
    }

    /// Live registrations, oldest first. After a stop this holds only the
    /// registrations the host failed to release.
    pub fn registrations(&self) -> &[RegistrationHandle] {
        self.ledger.handles()
    }

    /// The host this controller registers into.
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Runs a startup pass for `ctx`.
    ///
    /// Errors never escape as `Err`: the returned report carries the end
    /// state, per-capability outcomes and the failure, if any. Use
    /// [`StartupReport::into_result`] to turn a failure into an error.
    pub fn start(&mut self, ctx: &PluginContext) -> StartupReport {
        if !self.state.accepts_start() {
            log::warn!(
                "Ignoring start of plugin '{}': controller is {}",
                ctx.name(),
                self.state
            );
            let mut report = StartupReport::new(ctx.name(), self.state);
            report.failure = Some(StartupFailure::InvalidState { state: self.state });
            return report;
        }

        if !self.ledger.is_empty() {
            let mut report = StartupReport::new(ctx.name(), self.state);
            let previous = self.plugin.clone().unwrap_or_else(|| ctx.name().to_string());
            log::info!(
                "Releasing {} leftover registration(s) of plugin '{}'",
                self.ledger.len(),
                previous
            );
            let mut released = Vec::new();
            self.unwind(&previous, &mut released, &mut report.warnings, false);
            if !self.ledger.is_empty() {
                log::error!(
                    "Plugin '{}' cannot start: {} registration(s) are still held",
                    ctx.name(),
                    self.ledger.len()
                );
                report.failure = Some(StartupFailure::Leftovers {
                    count: self.ledger.len(),
                });
                return report;
            }
        }

        self.plugin = Some(ctx.name().to_string());
        self.transition(LifecycleState::Scanning);
        log::info!("Starting plugin '{}' {}", ctx.name(), ctx.version());

        if let Some(failure) = check_api(ctx) {
            return self.fail(ctx, failure);
        }

        let descriptors = match self.scanner.scan(ctx.source()).finish().into_result() {
            Ok(descriptors) => descriptors,
            Err(errors) => {
                for error in &errors {
                    log::error!("Invalid declaration in plugin '{}': {}", ctx.name(), error);
                }
                return self.fail(ctx, StartupFailure::Scan(errors));
            }
        };
        log::debug!("Scanned {} capabilities for plugin '{}'", descriptors.len(), ctx.name());

        self.transition(LifecycleState::Resolving);
        let instances = match Resolver::new(ctx.container(), ctx.config()).resolve_all(&descriptors) {
            Ok(instances) => instances,
            Err(errors) => {
                for error in &errors {
                    log::error!("Unresolved capability in plugin '{}': {}", ctx.name(), error);
                }
                return self.fail(ctx, StartupFailure::Resolution(errors));
            }
        };

        self.transition(LifecycleState::Registering);
        let mut report = StartupReport::new(ctx.name(), self.state);
        let ordered = Registrar::order(instances);
        match self.register_all(ctx.name(), &ordered, &mut report.outcomes) {
            Ok(()) => {
                self.transition(LifecycleState::Active);
                log::info!(
                    "Plugin '{}' is active with {} registrations",
                    ctx.name(),
                    self.ledger.len()
                );
            }
            Err((error, skipped)) => {
                log::error!("{}", error);
                self.transition(LifecycleState::ShuttingDown { rollback: true });
                let mut unwound = Vec::new();
                self.unwind(ctx.name(), &mut unwound, &mut report.warnings, true);
                for rolled in unwound {
                    let registered = report
                        .outcomes
                        .iter_mut()
                        .find(|outcome| outcome.kind == rolled.kind && outcome.identity == rolled.identity);
                    if let Some(outcome) = registered {
                        outcome.status = rolled.status;
                    }
                }
                report.outcomes.extend(skipped);
                self.transition(LifecycleState::Failed);
                report.failure = Some(StartupFailure::Registration(error));
            }
        }
        report.state = self.state;
        report
    }

    /// Unregisters everything the last successful start registered.
    ///
    /// Registrations the host fails to release stay in the ledger. Calling
    /// `stop` again from `Stopped` or `Failed` retries just those, without a
    /// state change; the next `start` retries them too and refuses to run
    /// while any remain. Otherwise, outside `Active` this does nothing and
    /// returns an empty report.
    pub fn stop(&mut self) -> ShutdownReport {
        if self.state != LifecycleState::Active {
            if self.ledger.is_empty() {
                log::debug!("Stop ignored: controller is {}", self.state);
                return ShutdownReport {
                    state: self.state,
                    ..ShutdownReport::default()
                };
            }
            return self.release_leftovers();
        }

        let plugin = self.plugin.clone().unwrap_or_default();
        log::info!("Stopping plugin '{}'", plugin);
        self.transition(LifecycleState::ShuttingDown { rollback: false });

        let mut report = ShutdownReport {
            plugin: Some(plugin.clone()),
            ..ShutdownReport::default()
        };
        self.unwind(&plugin, &mut report.outcomes, &mut report.warnings, false);
        self.transition(LifecycleState::Stopped);
        report.state = self.state;

        if report.is_clean() {
            log::info!("Plugin '{}' stopped", plugin);
        } else {
            log::warn!(
                "Plugin '{}' stopped with {} unregistration warning(s)",
                plugin,
                report.warnings.len()
            );
        }
        report
    }

    /// Retries the registrations an earlier unwind could not release.
    fn release_leftovers(&mut self) -> ShutdownReport {
        let plugin = self.plugin.clone().unwrap_or_default();
        log::info!(
            "Retrying {} leftover registration(s) of plugin '{}'",
            self.ledger.len(),
            plugin
        );
        let mut report = ShutdownReport {
            plugin: Some(plugin.clone()),
            state: self.state,
            ..ShutdownReport::default()
        };
        self.unwind(&plugin, &mut report.outcomes, &mut report.warnings, false);
        report
    }

    /// Registers in order until the host refuses one. On failure the
    /// untouched remainder comes back as `NotAttempted` outcomes.
    fn register_all(
        &mut self,
        plugin: &str,
        instances: &[CapabilityInstance],
        outcomes: &mut Vec<CapabilityOutcome>,
    ) -> Result<(), (RegistrationError, Vec<CapabilityOutcome>)> {
        let host = Arc::clone(&self.host);
        let registrar = Registrar::new(host.as_ref(), plugin);

        for (index, instance) in instances.iter().enumerate() {
            if let Err(error) = registrar.register(instance, &mut self.ledger) {
                outcomes.push(CapabilityOutcome::new(
                    instance.kind(),
                    instance.identity(),
                    OutcomeStatus::Failed {
                        reason: error.source.to_string(),
                    },
                ));
                let skipped = instances[index + 1..]
                    .iter()
                    .map(|rest| CapabilityOutcome::new(rest.kind(), rest.identity(), OutcomeStatus::NotAttempted))
                    .collect();
                return Err((error, skipped));
            }
            outcomes.push(CapabilityOutcome::new(
                instance.kind(),
                instance.identity(),
                OutcomeStatus::Registered,
            ));
        }
        Ok(())
    }

    /// Drains the ledger newest first through the host's unregister calls.
    /// Handles the host fails to release go back into the ledger.
    fn unwind(
        &mut self,
        plugin: &str,
        outcomes: &mut Vec<CapabilityOutcome>,
        warnings: &mut Vec<UnregistrationWarning>,
        rollback: bool,
    ) {
        let host = Arc::clone(&self.host);
        let registrar = Registrar::new(host.as_ref(), plugin);

        let handles: Vec<RegistrationHandle> = self.ledger.drain_newest_first().collect();
        let mut retained = Vec::new();
        for handle in handles {
            let status = match registrar.unregister(&handle) {
                Ok(()) if rollback => OutcomeStatus::RolledBack,
                Ok(()) => OutcomeStatus::Unregistered,
                Err(warning) => {
                    log::warn!("{}", warning);
                    let reason = warning.source.to_string();
                    warnings.push(warning);
                    retained.push(handle.clone());
                    if rollback {
                        OutcomeStatus::RollbackFailed { reason }
                    } else {
                        OutcomeStatus::UnregisterFailed { reason }
                    }
                }
            };
            outcomes.push(CapabilityOutcome::new(handle.kind, handle.identity, status));
        }
        for handle in retained.into_iter().rev() {
            self.ledger.record(handle);
        }
    }

    fn fail(&mut self, ctx: &PluginContext, failure: StartupFailure) -> StartupReport {
        self.transition(LifecycleState::Failed);
        let mut report = StartupReport::new(ctx.name(), self.state);
        report.failure = Some(failure);
        report
    }

    fn transition(&mut self, next: LifecycleState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal lifecycle transition {} -> {}",
            self.state,
            next
        );
        log::debug!("Lifecycle {} -> {}", self.state, next);
        self.state = next;
    }
}

fn check_api(ctx: &PluginContext) -> Option<StartupFailure> {
    let required = ctx
        .compatible_api()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" || ");

    let api = match api_version() {
        Ok(api) => api,
        Err(error) => {
            return Some(StartupFailure::IncompatibleApi {
                plugin: ctx.name().to_string(),
                version: ctx.version().to_string(),
                required,
                api: error.to_string(),
            });
        }
    };

    if is_api_compatible(ctx.compatible_api(), &api) {
        None
    } else {
        log::error!(
            "Plugin '{}' requires API {} but the host provides {}",
            ctx.name(),
            required,
            api
        );
        Some(StartupFailure::IncompatibleApi {
            plugin: ctx.name().to_string(),
            version: ctx.version().to_string(),
            required,
            api: api.to_string(),
        })
    }
}
