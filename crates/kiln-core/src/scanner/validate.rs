//! Completeness checks turning one declaration into a descriptor.
use std::collections::HashSet;

use crate::capability::descriptor::Definition;
use crate::capability::{
    CapabilityDescriptor, CapabilityKind, CommandDeclaration, CommandMetadata, Declaration, ListenerDeclaration,
    ListenerMetadata, RouteDeclaration, RouteMetadata, SchemaDeclaration, SchemaMetadata,
};
use crate::command::Route;
use crate::scanner::ScanError;

/// Errors found in a single declaration.
struct Findings<'a> {
    unit: &'a str,
    kind: CapabilityKind,
    identity: String,
    errors: Vec<ScanError>,
}

impl<'a> Findings<'a> {
    fn new(unit: &'a str, kind: CapabilityKind, identity: &str) -> Self {
        Self {
            unit,
            kind,
            identity: identity.to_string(),
            errors: Vec::new(),
        }
    }

    fn missing(&mut self, field: &'static str) {
        self.errors.push(ScanError::MissingMetadata {
            unit: self.unit.to_string(),
            kind: self.kind,
            identity: self.identity.clone(),
            field,
        });
    }

    fn invalid(&mut self, reason: impl Into<String>) {
        self.errors.push(ScanError::InvalidMetadata {
            unit: self.unit.to_string(),
            kind: self.kind,
            identity: self.identity.clone(),
            reason: reason.into(),
        });
    }

    fn finish(self, build: impl FnOnce() -> Option<CapabilityDescriptor>) -> Result<CapabilityDescriptor, Vec<ScanError>> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        build().ok_or(self.errors)
    }
}

pub(crate) fn validate(unit: &str, declaration: &Declaration) -> Result<CapabilityDescriptor, Vec<ScanError>> {
    match declaration {
        Declaration::Command(command) => validate_command(unit, command),
        Declaration::Listener(listener) => validate_listener(unit, listener),
        Declaration::ConfigSchema(schema) => validate_schema(unit, schema),
    }
}

/// Lower-cased, trimmed command name or alias.
pub(crate) fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

fn validate_command(unit: &str, command: &CommandDeclaration) -> Result<CapabilityDescriptor, Vec<ScanError>> {
    let name = normalize_label(&command.name);
    let mut findings = Findings::new(unit, CapabilityKind::Command, &name);

    if name.is_empty() {
        findings.missing("name");
    } else if name.contains(char::is_whitespace) {
        findings.invalid("command names cannot contain whitespace");
    }

    let mut aliases: Vec<String> = Vec::new();
    for alias in command.aliases.iter().map(|alias| normalize_label(alias)) {
        if alias.is_empty() || alias.contains(char::is_whitespace) {
            findings.invalid(format!("alias '{}' is not a single word", alias));
        } else if alias == name || aliases.contains(&alias) {
            findings.invalid(format!("alias '{}' is declared twice", alias));
        } else {
            aliases.push(alias);
        }
    }

    let permission = match command.permission.as_deref().map(str::trim) {
        Some("") => {
            findings.invalid("permission node is empty");
            None
        }
        other => other.map(str::to_string),
    };

    let mut declared: Vec<&RouteDeclaration> = Vec::new();
    if command.primary.is_declared() || command.routes.is_empty() {
        declared.push(&command.primary);
    }
    declared.extend(&command.routes);

    let mut routes = Vec::new();
    let mut constructors = Vec::new();
    let mut shapes: Vec<(String, String)> = Vec::new();
    let mut dependency_keys = command.dependencies.clone();
    for route in declared.iter().copied() {
        let label = match route.pattern.as_deref().map(str::trim) {
            Some(pattern) if !pattern.is_empty() => pattern.to_string(),
            _ => "(default)".to_string(),
        };
        dependency_keys.extend(route.dependencies.iter().cloned());
        let Some(metadata) = validate_route(&mut findings, route) else {
            continue;
        };
        let shape = metadata.shape();
        match shapes.iter().find(|(taken, _)| *taken == shape) {
            Some((_, first)) => findings.invalid(format!("route '{}' overlaps route '{}'", label, first)),
            None => shapes.push((shape, label)),
        }
        routes.push(metadata);
    }

    let dependencies = collect_dependencies(&mut findings, &dependency_keys);

    for route in declared {
        match &route.constructor {
            Some(constructor) => constructors.push(constructor.clone()),
            None if std::ptr::eq(route, &command.primary) => findings.missing("handler"),
            None => findings.invalid(format!(
                "route '{}' has no handler",
                route.pattern.as_deref().unwrap_or_default().trim()
            )),
        }
    }

    findings.finish(|| {
        let metadata = CommandMetadata {
            aliases,
            permission,
            description: command.description.clone(),
            routes,
        };
        Some(CapabilityDescriptor::new(
            name.clone(),
            dependencies,
            unit.to_string(),
            Definition::Command { metadata, constructors },
        ))
    })
}

/// Parses one route and checks its resolvers and permission. `None` when the
/// pattern itself is broken.
fn validate_route(findings: &mut Findings<'_>, route: &RouteDeclaration) -> Option<RouteMetadata> {
    let parsed = match route.pattern.as_deref().map(Route::parse).transpose() {
        Ok(parsed) => parsed,
        Err(err) => {
            findings.invalid(format!("route: {}", err));
            return None;
        }
    };

    for (argument, _) in &route.resolvers {
        if !parsed.as_ref().is_some_and(|parsed| parsed.has_argument(argument)) {
            findings.invalid(format!("resolver for unknown argument '{}'", argument));
        }
    }

    let permission = match route.permission.as_deref().map(str::trim) {
        Some("") => {
            findings.invalid("permission node is empty");
            None
        }
        other => other.map(str::to_string),
    };

    Some(RouteMetadata {
        route: parsed,
        permission,
        description: route.description.clone(),
        asynchronous: route.asynchronous,
        resolvers: route.resolvers.clone(),
    })
}

fn validate_listener(unit: &str, listener: &ListenerDeclaration) -> Result<CapabilityDescriptor, Vec<ScanError>> {
    let identity = listener.identity.trim().to_string();
    let mut findings = Findings::new(unit, CapabilityKind::Listener, &identity);

    if identity.is_empty() {
        findings.missing("identity");
    }

    let event = listener.event.as_deref().map(str::trim).filter(|event| !event.is_empty());
    if event.is_none() {
        findings.missing("event type");
    }

    let dependencies = collect_dependencies(&mut findings, &listener.dependencies);

    if listener.constructor.is_none() {
        findings.missing("handler");
    }

    findings.finish(|| {
        let metadata = ListenerMetadata {
            event: event?.to_string(),
            priority: listener.priority.unwrap_or_default(),
        };
        let constructor = listener.constructor.clone()?;
        Some(CapabilityDescriptor::new(
            identity.clone(),
            dependencies,
            unit.to_string(),
            Definition::Listener { metadata, constructor },
        ))
    })
}

fn validate_schema(unit: &str, schema: &SchemaDeclaration) -> Result<CapabilityDescriptor, Vec<ScanError>> {
    let identity = schema.identity.trim().to_string();
    let mut findings = Findings::new(unit, CapabilityKind::ConfigSchema, &identity);

    if identity.is_empty() {
        findings.missing("identity");
    }
    if schema.backing.is_none() {
        findings.missing("backing type");
    }
    for (field, reason) in &schema.rejected_defaults {
        findings.invalid(format!("default for '{}' cannot be stored: {}", field, reason));
    }
    if schema.defaults.keys().iter().any(|field| field.trim().is_empty()) {
        findings.invalid("default with an empty field name");
    }

    findings.finish(|| {
        let (type_name, validator) = schema.backing.clone()?;
        let metadata = SchemaMetadata {
            type_name,
            defaults: schema.defaults.clone(),
            validator,
        };
        Some(CapabilityDescriptor::new(
            identity.clone(),
            Vec::new(),
            unit.to_string(),
            Definition::ConfigSchema { metadata },
        ))
    })
}

/// Trims keys and collapses duplicates, keeping the first occurrence.
fn collect_dependencies(findings: &mut Findings<'_>, declared: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dependencies = Vec::new();
    for key in declared.iter().map(|key| key.trim()) {
        if key.is_empty() {
            findings.invalid("empty dependency key");
        } else if seen.insert(key.to_string()) {
            dependencies.push(key.to_string());
        }
    }
    dependencies
}
