use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::capability::{CapabilityDescriptor, CapabilityKind, CapabilityObject, Declaration};
use crate::command::{Arguments, CommandHandler, CommandOutcome, Invoker};
use crate::config::ConfigData;
use crate::event::EventResult;
use crate::injection::{BindingError, Dependencies, Injector, ResolutionError, Resolver};
use crate::scanner::{CodeUnit, Scanner};

#[derive(Debug, Deserialize)]
struct Economy {
    currency: String,
}

struct Bank {
    name: String,
}

struct BalanceCommand {
    bank: Arc<Bank>,
    currency: String,
}

impl CommandHandler for BalanceCommand {
    fn execute(&self, _invoker: &Invoker, _arguments: &Arguments) -> CommandOutcome {
        CommandOutcome::success(format!("{} holds your {}", self.bank.name, self.currency))
    }
}

fn descriptors(units: Vec<CodeUnit>) -> Vec<CapabilityDescriptor> {
    Scanner::new().scan(&units).finish().into_result().unwrap()
}

fn economy_units() -> Vec<CodeUnit> {
    vec![CodeUnit::new("economy")
        .declare(
            Declaration::command("balance")
                .depends_on("bank")
                .depends_on("config:economy")
                .handler(|deps| {
                    let config = deps.config("economy")?;
                    Ok(BalanceCommand {
                        bank: deps.get::<Bank>("bank")?,
                        currency: config.get::<String>("currency")?,
                    })
                }),
        )
        .declare(
            Declaration::config_schema("economy")
                .backed_by::<Economy>()
                .default("currency", "coins"),
        )]
}

#[test]
fn test_resolves_dependencies_and_config() {
    let mut injector = Injector::new();
    injector.bind_instance("bank", Bank { name: "Central".into() });
    let mut config = ConfigData::new();
    config.set("economy", json!({ "currency": "gems" })).unwrap();

    let instances = Resolver::new(&injector, &config)
        .resolve_all(&descriptors(economy_units()))
        .unwrap();

    // Discovery order is kept even though schemas resolve first.
    assert_eq!(instances[0].kind(), CapabilityKind::Command);
    assert_eq!(instances[1].kind(), CapabilityKind::ConfigSchema);
    match instances[0].object() {
        CapabilityObject::Command { handlers, .. } => assert_eq!(
            handlers[0].execute(&Invoker::console(), &Arguments::default()),
            CommandOutcome::success("Central holds your gems")
        ),
        other => panic!("unexpected object {:?}", other),
    }
    match instances[1].object() {
        CapabilityObject::ConfigSchema(binding) => {
            assert_eq!(binding.deserialize::<Economy>().unwrap().currency, "gems")
        }
        other => panic!("unexpected object {:?}", other),
    }
}

#[test]
fn test_schema_defaults_apply_without_section() {
    let mut injector = Injector::new();
    injector.bind_instance("bank", Bank { name: "Central".into() });

    let instances = Resolver::new(&injector, &ConfigData::new())
        .resolve_all(&descriptors(economy_units()))
        .unwrap();

    let CapabilityObject::ConfigSchema(binding) = instances[1].object() else {
        panic!("expected a schema");
    };
    assert_eq!(binding.get::<String>("currency").unwrap(), "coins");
}

#[test]
fn test_all_missing_dependencies_are_reported() {
    let units = vec![CodeUnit::new("unit")
        .declare(
            Declaration::command("pay")
                .depends_on("bank")
                .depends_on("ledger")
                .executes(|_, _| CommandOutcome::done()),
        )
        .declare(
            Declaration::listener("audit")
                .on("player.pay")
                .depends_on("ledger")
                .executes(|_| EventResult::Continue),
        )];

    let errors = Resolver::new(&Injector::new(), &ConfigData::new())
        .resolve_all(&descriptors(units))
        .unwrap_err();

    let summary: Vec<(&str, String)> = errors
        .iter()
        .map(|err| match err {
            ResolutionError::Dependency { capability, dependency, .. } => (capability.as_str(), dependency.clone()),
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("pay", "bank".to_string()),
            ("pay", "ledger".to_string()),
            ("audit", "ledger".to_string()),
        ]
    );
}

#[test]
fn test_cycle_surfaces_as_resolution_error() {
    let mut injector = Injector::new();
    injector
        .bind_provider("A", &["B"], |_: &Dependencies| Ok(()))
        .bind_provider("B", &["A"], |_: &Dependencies| Ok(()));
    let units = vec![CodeUnit::new("unit").declare(
        Declaration::command("loop")
            .depends_on("A")
            .executes(|_, _| CommandOutcome::done()),
    )];

    let errors = Resolver::new(&injector, &ConfigData::new())
        .resolve_all(&descriptors(units))
        .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0],
        ResolutionError::Dependency {
            capability: "loop".into(),
            kind: CapabilityKind::Command,
            dependency: "A".into(),
            source: BindingError::Cycle { path: vec!["A".into(), "B".into(), "A".into()] },
        }
    );
    let message = errors[0].to_string();
    assert!(message.contains("A -> B -> A"), "{}", message);
}

#[test]
fn test_constructor_failure_is_construction_error() {
    let units = vec![CodeUnit::new("unit").declare(
        Declaration::listener("fragile")
            .on("server.tick")
            .handler(|_: &Dependencies| -> Result<fn(&dyn crate::event::Event) -> EventResult, _> {
                Err("not today".into())
            }),
    )];

    let errors = Resolver::new(&Injector::new(), &ConfigData::new())
        .resolve_all(&descriptors(units))
        .unwrap_err();

    assert_eq!(
        errors,
        vec![ResolutionError::Construction {
            capability: "fragile".into(),
            kind: CapabilityKind::Listener,
            message: "not today".into(),
        }]
    );
}

#[test]
fn test_schema_type_mismatch_fails_resolution() {
    let mut config = ConfigData::new();
    config.set("economy", json!({ "currency": 42 })).unwrap();
    let units = vec![CodeUnit::new("unit").declare(
        Declaration::config_schema("economy")
            .backed_by::<Economy>()
            .default("currency", "coins"),
    )];

    let errors = Resolver::new(&Injector::new(), &config)
        .resolve_all(&descriptors(units))
        .unwrap_err();

    assert!(matches!(
        &errors[0],
        ResolutionError::Construction { capability, kind: CapabilityKind::ConfigSchema, .. } if capability == "economy"
    ));
}
