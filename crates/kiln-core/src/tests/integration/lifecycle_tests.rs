use std::sync::Arc;

use serde_json::Value;

use super::common::{HostCall, RecordingHost};
use crate::capability::CapabilityKind::{self, Command, ConfigSchema, Listener};
use crate::capability::Declaration;
use crate::command::{CommandOutcome, Invoker};
use crate::error::BoxError;
use crate::event::{EventResult, ServerEvent};
use crate::injection::{BindingError, Dependencies, Injector, ResolutionError};
use crate::lifecycle::{LifecycleController, LifecycleState, OutcomeStatus, PluginContext, StartupFailure};
use crate::scanner::{CodeUnit, ScanError};
use crate::version::VersionRange;

fn warps_units() -> Vec<CodeUnit> {
    vec![
        CodeUnit::new("warps::commands")
            .declare(Declaration::command("warp").executes(|_, _| CommandOutcome::success("whoosh")))
            .declare(Declaration::config_schema("warps").backed_by::<Value>().default("cooldown", 3))
            .declare(Declaration::listener("audit").on("player.teleport").executes(|_| EventResult::Continue)),
        CodeUnit::new("warps::events")
            .declare(Declaration::listener("arrival").on("player.teleport").executes(|_| EventResult::Continue))
            .declare(Declaration::command("home").executes(|_, _| CommandOutcome::done())),
    ]
}

/// Registration order of `warps_units`.
const ORDER: [(CapabilityKind, &str); 5] = [
    (ConfigSchema, "warps"),
    (Listener, "audit"),
    (Listener, "arrival"),
    (Command, "warp"),
    (Command, "home"),
];

fn registers(entries: &[(CapabilityKind, &str)]) -> Vec<HostCall> {
    entries
        .iter()
        .map(|(kind, identity)| HostCall::Register(*kind, identity.to_string()))
        .collect()
}

fn unregisters(entries: &[(CapabilityKind, &str)]) -> Vec<HostCall> {
    entries
        .iter()
        .rev()
        .map(|(kind, identity)| HostCall::Unregister(*kind, identity.to_string()))
        .collect()
}

fn setup(host: RecordingHost) -> (Arc<RecordingHost>, LifecycleController, PluginContext) {
    let host = Arc::new(host);
    let controller = LifecycleController::new(host.clone());
    (host, controller, PluginContext::new("warps", warps_units()))
}

#[test]
fn test_registration_follows_kind_order() {
    let (host, mut controller, ctx) = setup(RecordingHost::new());

    let report = controller.start(&ctx);

    assert_eq!(report.state, LifecycleState::Active);
    assert_eq!(host.calls(), registers(&ORDER));
    let identities: Vec<_> = report.outcomes.iter().map(|o| (o.kind, o.identity.as_str())).collect();
    assert_eq!(identities, ORDER.to_vec());
    assert_eq!(
        host.memory().dispatch(&Invoker::console(), "warp"),
        CommandOutcome::success("whoosh")
    );
    assert_eq!(host.memory().listener_count("player.teleport"), 2);
    assert_eq!(
        host.memory().publish(&ServerEvent::new("player.teleport")),
        EventResult::Continue
    );
}

#[test]
fn test_failed_registration_is_atomic_for_every_position() {
    for k in 0..ORDER.len() {
        let (host, mut controller, ctx) = setup(RecordingHost::new().fail_on_registration(k));

        let report = controller.start(&ctx);

        assert_eq!(report.state, LifecycleState::Failed, "k = {}", k);
        assert_eq!(host.live(), 0, "k = {}", k);
        let mut expected = registers(&ORDER[..=k]);
        expected.extend(unregisters(&ORDER[..k]));
        assert_eq!(host.calls(), expected, "k = {}", k);

        let Some(StartupFailure::Registration(error)) = &report.failure else {
            panic!("k = {}: expected a registration failure, got {:?}", k, report.failure);
        };
        assert_eq!((error.kind, error.capability.as_str()), ORDER[k]);
        assert!(report.warnings.is_empty());

        let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status.clone()).collect();
        assert_eq!(statuses.len(), ORDER.len());
        assert!(statuses[..k].iter().all(|s| *s == OutcomeStatus::RolledBack));
        assert!(matches!(statuses[k], OutcomeStatus::Failed { .. }));
        assert!(statuses[k + 1..].iter().all(|s| *s == OutcomeStatus::NotAttempted));
        assert!(controller.registrations().is_empty());
    }
}

#[test]
fn test_rollback_failure_does_not_mask_the_cause() {
    let (host, mut controller, ctx) = setup(RecordingHost::new().fail_on_registration(3).fail_unregister("audit"));

    let report = controller.start(&ctx);

    assert_eq!(report.state, LifecycleState::Failed);
    assert!(matches!(report.failure, Some(StartupFailure::Registration(_))));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].capability, "audit");
    assert!(matches!(
        report.outcome_of("audit").map(|o| &o.status),
        Some(OutcomeStatus::RollbackFailed { .. })
    ));
    // every handle was still attempted, newest first
    assert_eq!(host.calls()[4..].to_vec(), unregisters(&ORDER[..3]));
}

#[test]
fn test_round_trip_unregisters_in_reverse() {
    let units = vec![
        CodeUnit::new("motd")
            .declare(Declaration::command("motd").executes(|_, _| CommandOutcome::done()))
            .declare(Declaration::listener("greet").on("player.join").executes(|_| EventResult::Continue))
            .declare(Declaration::config_schema("motd").backed_by::<Value>()),
    ];
    let host = Arc::new(RecordingHost::new());
    let mut controller = LifecycleController::new(host.clone());
    let expected = [(ConfigSchema, "motd"), (Listener, "greet"), (Command, "motd")];

    let started = controller.start(&PluginContext::new("motd", units));
    assert_eq!(started.registered_count(), 3);
    let stopped = controller.stop();

    assert_eq!(stopped.state, LifecycleState::Stopped);
    assert_eq!(controller.state(), LifecycleState::Stopped);
    assert_eq!(stopped.unregistered_count(), 3);
    let mut calls = registers(&expected);
    calls.extend(unregisters(&expected));
    assert_eq!(host.calls(), calls);
    assert_eq!(host.live(), 0);
}

#[test]
fn test_shutdown_is_best_effort() {
    let (host, mut controller, ctx) = setup(RecordingHost::new().fail_unregister("warp"));
    controller.start(&ctx);
    host.clear_calls();

    let report = controller.stop();

    assert_eq!(report.state, LifecycleState::Stopped);
    assert_eq!(host.calls(), unregisters(&ORDER));
    assert_eq!(report.warnings.len(), 1);
    assert!(!report.is_clean());
    assert_eq!(report.unregistered_count(), 4);
    assert!(matches!(
        report.outcomes[1].status,
        OutcomeStatus::UnregisterFailed { .. }
    ));
}

#[test]
fn test_unreleased_registration_is_retried_by_next_stop() {
    let (host, mut controller, ctx) = setup(RecordingHost::new().fail_unregister("warp"));
    controller.start(&ctx);
    controller.stop();

    assert_eq!(controller.state(), LifecycleState::Stopped);
    let held: Vec<_> = controller.registrations().iter().map(|h| h.identity.as_str()).collect();
    assert_eq!(held, vec!["warp"]);
    assert_eq!(host.live(), 1);

    host.recover("warp");
    host.clear_calls();
    let retry = controller.stop();

    assert_eq!(retry.state, LifecycleState::Stopped);
    assert!(retry.is_clean());
    assert_eq!(retry.unregistered_count(), 1);
    assert_eq!(host.calls(), unregisters(&[(Command, "warp")]));
    assert!(controller.registrations().is_empty());
    assert_eq!(host.live(), 0);
    assert!(controller.stop().is_noop());
}

#[test]
fn test_restart_releases_leftovers_first() {
    let (host, mut controller, ctx) = setup(RecordingHost::new().fail_unregister("warp"));
    controller.start(&ctx);
    controller.stop();
    host.clear_calls();

    let refused = controller.start(&ctx);
    assert_eq!(refused.state, LifecycleState::Stopped);
    assert_eq!(refused.failure, Some(StartupFailure::Leftovers { count: 1 }));
    assert_eq!(refused.warnings.len(), 1);
    assert_eq!(host.calls(), unregisters(&[(Command, "warp")]));

    host.recover("warp");
    host.clear_calls();
    let report = controller.start(&ctx);

    assert_eq!(report.state, LifecycleState::Active, "{}", report);
    let mut calls = unregisters(&[(Command, "warp")]);
    calls.extend(registers(&ORDER));
    assert_eq!(host.calls(), calls);
    assert_eq!(host.live(), ORDER.len());
}

#[test]
fn test_command_routes_share_one_registration() {
    let units = vec![CodeUnit::new("economy").declare(
        Declaration::command("eco")
            .permission("eco.use")
            .depends_on("bank")
            .handler(|deps: &Dependencies| {
                let bank = deps.get::<String>("bank")?;
                Ok(move |_: &Invoker, _: &crate::command::Arguments| {
                    CommandOutcome::success(format!("{} balance: 10", bank))
                })
            })
            .with_route(
                Declaration::route("give <player> <amount>")
                    .argument("amount", crate::command::resolver::IntegerResolver)
                    .executes(|_, args| {
                        CommandOutcome::success(format!(
                            "gave {} {}",
                            args.value("player").unwrap_or_default(),
                            args.value("amount").unwrap_or_default()
                        ))
                    }),
            )
            .with_route(
                Declaration::route("take <player> <amount>")
                    .permission("eco.admin")
                    .executes(|_, args| {
                        CommandOutcome::success(format!("took {}", args.value("amount").unwrap_or_default()))
                    }),
            ),
    )];
    let mut injector = Injector::new();
    injector.bind_instance("bank", "Central".to_string());
    let host = Arc::new(RecordingHost::new());
    let mut controller = LifecycleController::new(host.clone());

    let report = controller.start(&PluginContext::new("economy", units).with_container(injector));

    assert_eq!(report.state, LifecycleState::Active, "{}", report);
    assert_eq!(host.calls(), registers(&[(Command, "eco")]));
    let user = Invoker::player("alex").grant("eco.use");
    let memory = host.memory();
    assert_eq!(memory.dispatch(&user, "eco"), CommandOutcome::success("Central balance: 10"));
    assert_eq!(memory.dispatch(&user, "eco give sam +5"), CommandOutcome::success("gave sam 5"));
    assert_eq!(memory.dispatch(&Invoker::console(), "eco take sam 2"), CommandOutcome::success("took 2"));
    assert_eq!(
        memory.dispatch(&Invoker::player("guest"), "eco take sam 2"),
        CommandOutcome::Denied { permission: "eco.admin".into() }
    );

    controller.stop();
    assert!(matches!(memory.dispatch(&user, "eco"), CommandOutcome::Unknown(_)));
}

#[test]
fn test_stop_is_idempotent() {
    let (host, mut controller, ctx) = setup(RecordingHost::new());

    assert!(controller.stop().is_noop());
    assert!(host.calls().is_empty());

    controller.start(&ctx);
    controller.stop();
    host.clear_calls();

    let second = controller.stop();
    assert!(second.is_noop());
    assert_eq!(second.state, LifecycleState::Stopped);
    assert!(host.calls().is_empty());
}

#[test]
fn test_restart_after_stop() {
    let (host, mut controller, ctx) = setup(RecordingHost::new());
    controller.start(&ctx);
    controller.stop();
    host.clear_calls();

    let report = controller.start(&ctx);

    assert_eq!(report.state, LifecycleState::Active);
    assert_eq!(host.calls(), registers(&ORDER));
    assert_eq!(host.live(), ORDER.len());
}

#[test]
fn test_start_outside_idle_states_touches_nothing() {
    let (host, mut controller, ctx) = setup(RecordingHost::new());
    controller.start(&ctx);
    host.clear_calls();

    let again = controller.start(&ctx);
    assert_eq!(
        again.failure,
        Some(StartupFailure::InvalidState {
            state: LifecycleState::Active
        })
    );
    assert_eq!(controller.state(), LifecycleState::Active);
    assert!(host.calls().is_empty());
    assert_eq!(host.live(), ORDER.len());

    let (host, mut controller, ctx) = setup(RecordingHost::new().fail_on_registration(0));
    controller.start(&ctx);
    host.clear_calls();

    let after_failure = controller.start(&ctx);
    assert_eq!(
        after_failure.failure,
        Some(StartupFailure::InvalidState {
            state: LifecycleState::Failed
        })
    );
    assert_eq!(controller.state(), LifecycleState::Failed);
    assert!(host.calls().is_empty());
}

#[test]
fn test_duplicate_command_registers_nothing() {
    let units = vec![
        CodeUnit::new("admin").declare(Declaration::command("reload").executes(|_, _| CommandOutcome::done())),
        CodeUnit::new("config").declare(Declaration::command("Reload").executes(|_, _| CommandOutcome::done())),
    ];
    let host = Arc::new(RecordingHost::new());
    let mut controller = LifecycleController::new(host.clone());

    let report = controller.start(&PluginContext::new("admin", units));

    assert_eq!(report.state, LifecycleState::Failed);
    assert_eq!(
        report.failure,
        Some(StartupFailure::Scan(vec![ScanError::DuplicateIdentity {
            unit: "config".into(),
            kind: Command,
            identity: "reload".into(),
            first_unit: "admin".into(),
        }]))
    );
    assert!(host.calls().is_empty());
}

#[test]
fn test_dependency_cycle_registers_nothing() {
    let mut injector = Injector::new();
    injector
        .bind_provider("a", &["b"], |_: &Dependencies| Ok::<u32, BoxError>(1))
        .bind_provider("b", &["a"], |_: &Dependencies| Ok::<u32, BoxError>(2));
    let units = vec![
        CodeUnit::new("loop")
            .declare(Declaration::command("spin").depends_on("a").executes(|_, _| CommandOutcome::done()))
            .declare(Declaration::command("idle").executes(|_, _| CommandOutcome::done())),
    ];
    let host = Arc::new(RecordingHost::new());
    let mut controller = LifecycleController::new(host.clone());

    let report = controller.start(&PluginContext::new("loop", units).with_container(injector));

    assert_eq!(report.state, LifecycleState::Failed);
    assert_eq!(
        report.failure,
        Some(StartupFailure::Resolution(vec![ResolutionError::Dependency {
            capability: "spin".into(),
            kind: Command,
            dependency: "a".into(),
            source: BindingError::Cycle {
                path: vec!["a".into(), "b".into(), "a".into()],
            },
        }]))
    );
    assert!(host.calls().is_empty());
}

#[test]
fn test_incompatible_api_fails_before_scanning() {
    let ctx = PluginContext::new("warps", warps_units())
        .with_version(semver::Version::new(2, 0, 0))
        .compatible_with(VersionRange::from_constraint("^9.0").unwrap());
    let host = Arc::new(RecordingHost::new());
    let mut controller = LifecycleController::new(host.clone());

    let report = controller.start(&ctx);

    assert_eq!(report.state, LifecycleState::Failed);
    let Some(StartupFailure::IncompatibleApi { plugin, version, required, api }) = &report.failure else {
        panic!("expected an API failure, got {:?}", report.failure);
    };
    assert_eq!(plugin, "warps");
    assert_eq!(version, "2.0.0");
    assert_eq!(required, "^9.0");
    assert_eq!(api, crate::constants::API_VERSION);
    assert!(host.calls().is_empty());
}

#[test]
fn test_compatible_api_starts() {
    let ctx = PluginContext::new("warps", warps_units())
        .compatible_with(VersionRange::from_constraint("^9.0").unwrap())
        .compatible_with(VersionRange::from_constraint(&format!("={}", crate::constants::API_VERSION)).unwrap());
    let (_, mut controller, _) = setup(RecordingHost::new());

    assert!(controller.start(&ctx).is_success());
}
