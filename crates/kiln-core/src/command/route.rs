//! Route patterns such as `"give <player> <amount> [reason=none]"`.
//!
//! Literals match case-insensitively and are stored lower-cased. `<name>` is
//! a required argument, `[name]` an optional one and `[name=value]` an
//! optional one with a default. Optional segments close the pattern: no
//! literal or required argument may follow them.
use std::collections::HashSet;
use std::fmt;

use crate::command::error::{ArgumentError, RouteError};
use crate::command::Arguments;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Required(String),
    Optional { name: String, default: Option<String> },
}

impl Segment {
    pub fn argument_name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Required(name) | Segment::Optional { name, .. } => Some(name),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(literal) => f.write_str(literal),
            Segment::Required(name) => write!(f, "<{}>", name),
            Segment::Optional { name, default: None } => write!(f, "[{}]", name),
            Segment::Optional { name, default: Some(default) } => write!(f, "[{}={}]", name, default),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    segments: Vec<Segment>,
}

impl Route {
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let mut segments = Vec::new();
        let mut names = HashSet::new();
        let mut seen_optional = false;

        for raw in pattern.split_whitespace() {
            let segment = parse_segment(raw)?;
            match &segment {
                Segment::Literal(literal) if seen_optional => {
                    return Err(RouteError::LiteralAfterOptional { literal: literal.clone() });
                }
                Segment::Required(name) if seen_optional => {
                    return Err(RouteError::RequiredAfterOptional { name: name.clone() });
                }
                Segment::Optional { .. } => seen_optional = true,
                _ => {}
            }
            if let Some(name) = segment.argument_name() {
                if !names.insert(name.to_string()) {
                    return Err(RouteError::DuplicateArgument { name: name.to_string() });
                }
            }
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn argument_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::argument_name)
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.argument_names().any(|candidate| candidate == name)
    }

    /// Usage line for `command`, e.g. `"give <player> <amount> [reason]"`.
    pub fn usage(&self, command: &str) -> String {
        std::iter::once(command.to_string())
            .chain(self.segments.iter().map(ToString::to_string))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Binds invocation tokens to the route's segments.
    ///
    /// Optional arguments without a token take their default, or stay unset
    /// when they have none.
    pub fn bind(&self, tokens: &[String]) -> Result<Arguments, ArgumentError> {
        let mut arguments = Arguments::new(tokens.to_vec());
        let mut remaining = tokens.iter();

        for segment in &self.segments {
            let token = remaining.next();
            match (segment, token) {
                (Segment::Literal(expected), Some(found)) => {
                    if !found.eq_ignore_ascii_case(expected) {
                        return Err(ArgumentError::LiteralMismatch {
                            expected: expected.clone(),
                            found: found.clone(),
                        });
                    }
                }
                (Segment::Literal(expected), None) => {
                    return Err(ArgumentError::Missing { name: expected.clone() });
                }
                (Segment::Required(name), Some(value)) => arguments.insert(name, value.clone()),
                (Segment::Required(name), None) => {
                    return Err(ArgumentError::Missing { name: name.clone() });
                }
                (Segment::Optional { name, .. }, Some(value)) => arguments.insert(name, value.clone()),
                (Segment::Optional { name, default }, None) => {
                    if let Some(default) = default {
                        arguments.insert(name, default.clone());
                    }
                }
            }
        }

        if let Some(extra) = remaining.next() {
            return Err(ArgumentError::Unexpected { token: extra.clone() });
        }
        Ok(arguments)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.segments.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join(" "))
    }
}

fn parse_segment(raw: &str) -> Result<Segment, RouteError> {
    let unclosed = || RouteError::UnclosedSegment { segment: raw.to_string() };

    if let Some(rest) = raw.strip_prefix('<') {
        let name = rest.strip_suffix('>').ok_or_else(unclosed)?;
        return Ok(Segment::Required(argument_name(raw, name)?));
    }
    if let Some(rest) = raw.strip_prefix('[') {
        let inner = rest.strip_suffix(']').ok_or_else(unclosed)?;
        let (name, default) = match inner.split_once('=') {
            Some((name, default)) => (name, Some(default.to_string())),
            None => (inner, None),
        };
        return Ok(Segment::Optional {
            name: argument_name(raw, name)?,
            default,
        });
    }
    if raw.contains(['<', '>', '[', ']']) {
        return Err(unclosed());
    }
    Ok(Segment::Literal(raw.to_lowercase()))
}

fn argument_name(raw: &str, name: &str) -> Result<String, RouteError> {
    let name = name.trim();
    if name.is_empty() || name.contains(['<', '>', '[', ']']) {
        return Err(RouteError::EmptyArgumentName { segment: raw.to_string() });
    }
    Ok(name.to_string())
}
