//! Argument resolvers: per-argument validation, normalization and tab
//! completion.
//!
//! A command attaches a resolver to a route argument with
//! `CommandDeclaration::argument`. The host runs the resolver over the bound
//! token before the handler sees it; handlers then read typed values with
//! [`Arguments::get`](crate::command::Arguments::get).
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::MAX_SUGGESTIONS;

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid markup pattern"));
static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{Alphabetic}\p{Nd}\s_]").expect("valid character pattern"));
static REPEATED_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("valid whitespace pattern"));

/// Strips markup tags, drops everything but letters, digits, whitespace and
/// underscores, then collapses runs of whitespace.
pub fn sanitize(input: &str) -> String {
    let without_tags = MARKUP_TAG.replace_all(input, "");
    let clean = DISALLOWED_CHARS.replace_all(&without_tags, "");
    REPEATED_WHITESPACE.replace_all(clean.trim(), " ").into_owned()
}

pub trait ArgumentResolver: Send + Sync {
    /// Human readable type, used in usage errors ("an integer").
    fn type_name(&self) -> &str;

    /// The normalized token, or `None` when the token is not a valid value.
    fn resolve(&self, token: &str) -> Option<String>;

    fn suggestions(&self, _prefix: &str) -> Vec<String> {
        Vec::new()
    }
}

impl fmt::Debug for dyn ArgumentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArgumentResolver({})", self.type_name())
    }
}

/// Free text, sanitized; blank input is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextResolver;

impl ArgumentResolver for TextResolver {
    fn type_name(&self) -> &str {
        "text"
    }

    fn resolve(&self, token: &str) -> Option<String> {
        if token.trim().is_empty() {
            return None;
        }
        Some(sanitize(token))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerResolver;

impl ArgumentResolver for IntegerResolver {
    fn type_name(&self) -> &str {
        "an integer"
    }

    fn resolve(&self, token: &str) -> Option<String> {
        token.trim().parse::<i64>().ok().map(|value| value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalResolver;

impl ArgumentResolver for DecimalResolver {
    fn type_name(&self) -> &str {
        "a number"
    }

    fn resolve(&self, token: &str) -> Option<String> {
        token
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|_| token.trim().to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanResolver;

impl ArgumentResolver for BooleanResolver {
    fn type_name(&self) -> &str {
        "true or false"
    }

    fn resolve(&self, token: &str) -> Option<String> {
        parse_bool(token).map(|value| value.to_string())
    }

    fn suggestions(&self, prefix: &str) -> Vec<String> {
        complete(["true", "false"], prefix)
    }
}

/// One of a fixed set of words, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ChoiceResolver {
    choices: Vec<String>,
}

impl ChoiceResolver {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(|choice| choice.into().to_lowercase()).collect(),
        }
    }
}

impl ArgumentResolver for ChoiceResolver {
    fn type_name(&self) -> &str {
        "one of the listed choices"
    }

    fn resolve(&self, token: &str) -> Option<String> {
        let token = token.trim().to_lowercase();
        self.choices.iter().find(|choice| **choice == token).cloned()
    }

    fn suggestions(&self, prefix: &str) -> Vec<String> {
        complete(self.choices.iter().map(String::as_str), prefix)
    }
}

/// Players a server knows about, online or not.
pub trait PlayerDirectory: Send + Sync {
    fn known_players(&self) -> Vec<String>;
}

/// A player the directory knows, matched case-insensitively and normalized
/// to the directory's spelling. Suggests known names.
#[derive(Clone)]
pub struct PlayerResolver {
    directory: Arc<dyn PlayerDirectory>,
}

impl PlayerResolver {
    pub fn new(directory: Arc<dyn PlayerDirectory>) -> Self {
        Self { directory }
    }
}

impl fmt::Debug for PlayerResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerResolver").finish_non_exhaustive()
    }
}

impl ArgumentResolver for PlayerResolver {
    fn type_name(&self) -> &str {
        "a known player"
    }

    fn resolve(&self, token: &str) -> Option<String> {
        let token = token.trim();
        self.directory
            .known_players()
            .into_iter()
            .find(|player| player.eq_ignore_ascii_case(token))
    }

    fn suggestions(&self, prefix: &str) -> Vec<String> {
        let players = self.directory.known_players();
        complete(players.iter().map(String::as_str), prefix)
    }
}

pub(crate) fn parse_bool(token: &str) -> Option<bool> {
    match token.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Candidates starting with `prefix` (case-insensitive), capped.
pub fn complete<'a, I>(candidates: I, prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let prefix = prefix.to_lowercase();
    candidates
        .into_iter()
        .filter(|candidate| candidate.to_lowercase().starts_with(&prefix))
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}
