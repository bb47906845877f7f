//! # Kiln Core Scanner
//!
//! Walks a plugin's code units and turns every declaration into a
//! [`CapabilityDescriptor`] or a [`ScanError`].
//!
//! A scan pass is a lazy iterator: declarations are validated as the pass is
//! advanced, and one bad declaration never stops the pass. Scanning the same
//! source again starts a fresh pass with the same result.
pub mod error;
mod validate;

use std::collections::{HashMap, HashSet, VecDeque};

use crate::capability::{CapabilityDescriptor, CapabilityKind, Declaration};

pub use error::ScanError;

/// A named group of declarations, usually one per plugin module.
#[derive(Debug, Clone)]
pub struct CodeUnit {
    name: String,
    declarations: Vec<Declaration>,
}

impl CodeUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declarations: Vec::new(),
        }
    }

    pub fn declare(mut self, declaration: impl Into<Declaration>) -> Self {
        self.declarations.push(declaration.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }
}

/// The code-scanning facility: enumerates a plugin's code units.
pub trait CodeUnitSource: Send + Sync {
    fn code_units(&self) -> Vec<CodeUnit>;
}

impl CodeUnitSource for Vec<CodeUnit> {
    fn code_units(&self) -> Vec<CodeUnit> {
        self.clone()
    }
}

impl CodeUnitSource for [CodeUnit] {
    fn code_units(&self) -> Vec<CodeUnit> {
        self.to_vec()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner;

impl Scanner {
    pub fn new() -> Self {
        Scanner
    }

    /// Starts a new pass over `source`.
    pub fn scan(&self, source: &dyn CodeUnitSource) -> ScanPass {
        ScanPass::new(source.code_units())
    }
}

/// Everything one pass produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub descriptors: Vec<CapabilityDescriptor>,
    pub errors: Vec<ScanError>,
}

impl ScanOutcome {
    pub fn into_result(self) -> Result<Vec<CapabilityDescriptor>, Vec<ScanError>> {
        if self.errors.is_empty() {
            Ok(self.descriptors)
        } else {
            Err(self.errors)
        }
    }
}

/// One pass over a set of code units, in unit then declaration order.
#[derive(Debug)]
pub struct ScanPass {
    units: Vec<CodeUnit>,
    unit: usize,
    declaration: usize,
    pending: VecDeque<Result<CapabilityDescriptor, ScanError>>,
    /// First declaring unit per identity, keyed by kind
    identities: HashMap<(CapabilityKind, String), String>,
}

impl ScanPass {
    fn new(units: Vec<CodeUnit>) -> Self {
        Self {
            units,
            unit: 0,
            declaration: 0,
            pending: VecDeque::new(),
            identities: HashMap::new(),
        }
    }

    /// Drains the rest of the pass.
    pub fn finish(self) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        for item in self {
            match item {
                Ok(descriptor) => outcome.descriptors.push(descriptor),
                Err(err) => outcome.errors.push(err),
            }
        }
        outcome
    }

    fn next_declaration(&mut self) -> Option<(String, Declaration)> {
        loop {
            let unit = self.units.get(self.unit)?;
            if let Some(declaration) = unit.declarations.get(self.declaration) {
                self.declaration += 1;
                return Some((unit.name.clone(), declaration.clone()));
            }
            self.unit += 1;
            self.declaration = 0;
        }
    }

    fn process(&mut self, unit: &str, declaration: &Declaration) {
        let kind = declaration.kind();
        let mut errors = Vec::new();

        // Names and aliases of commands share one namespace.
        let mut labels = vec![match declaration {
            Declaration::Command(command) => validate::normalize_label(&command.name),
            _ => declaration.identity().trim().to_string(),
        }];
        if let Declaration::Command(command) = declaration {
            labels.extend(command.aliases.iter().map(|alias| validate::normalize_label(alias)));
        }

        let mut own = HashSet::new();
        for label in labels.into_iter().filter(|label| !label.is_empty() && own.insert(label.clone())) {
            match self.identities.get(&(kind, label.clone())) {
                Some(first_unit) => errors.push(ScanError::DuplicateIdentity {
                    unit: unit.to_string(),
                    kind,
                    identity: label,
                    first_unit: first_unit.clone(),
                }),
                None => {
                    self.identities.insert((kind, label), unit.to_string());
                }
            }
        }

        match validate::validate(unit, declaration) {
            Ok(descriptor) if errors.is_empty() => {
                log::debug!("Discovered {} '{}' in {}", kind, descriptor.identity(), unit);
                self.pending.push_back(Ok(descriptor));
            }
            Ok(_) => {}
            Err(mut invalid) => errors.append(&mut invalid),
        }

        for err in errors {
            log::error!("Rejected declaration: {}", err);
            self.pending.push_back(Err(err));
        }
    }
}

impl Iterator for ScanPass {
    type Item = Result<CapabilityDescriptor, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            let (unit, declaration) = self.next_declaration()?;
            self.process(&unit, &declaration);
        }
    }
}
