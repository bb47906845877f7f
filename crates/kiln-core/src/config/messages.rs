//! Message catalog: keyed text templates with `{placeholder}` expansion.
//!
//! Keys are dotted paths. Nested tables flatten into them, so
//! `{"greeter": {"hello": "Hi"}}` and `{"greeter.hello": "Hi"}` name the same
//! entry. Two kinds of entries define placeholders instead of messages:
//!
//! * `placeholder.<name>` is visible to every message;
//! * `<namespace>.placeholder.<name>` is visible to messages whose first path
//!   segment is `<namespace>`, and shadows a global of the same name.
//!
//! Placeholder values may themselves use placeholders. Values passed to
//! [`MessageCatalog::format`] win over both kinds. `{{` and `}}` stand for
//! literal braces, and unknown placeholders are left as written.
//!
//! ```ignore
//! let catalog = MessageCatalog::from_config(binding.values());
//! let line = catalog.format("greeter.greet", [("name", "alex")]);
//! ```
use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::config::ConfigData;
use crate::constants::MAX_PLACEHOLDER_DEPTH;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_.]+)\}").expect("valid placeholder pattern"));

const PLACEHOLDER_SEGMENT: &str = "placeholder.";
const LEFT_BRACE: &str = "\u{0}lbr\u{0}";
const RIGHT_BRACE: &str = "\u{0}rbr\u{0}";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageCatalog {
    messages: BTreeMap<String, String>,
    /// Expanded global placeholders
    global: HashMap<String, String>,
    /// Expanded placeholders per namespace, globals not included
    namespaced: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(data: &ConfigData) -> Self {
        let mut catalog = Self::new();
        catalog.reload(data);
        catalog
    }

    /// Entries of `overrides` replace the matching entries of `defaults`,
    /// one message at a time.
    pub fn with_defaults(defaults: &ConfigData, overrides: &ConfigData) -> Self {
        let mut messages = flatten(defaults);
        messages.extend(flatten(overrides));
        let mut catalog = Self::new();
        catalog.rebuild(messages);
        catalog
    }

    /// Replaces every entry with those in `data`.
    pub fn reload(&mut self, data: &ConfigData) {
        self.rebuild(flatten(data));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// The unexpanded template, or the key itself when there is none.
    pub fn raw<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Expands the template under `key` with `values`, then the key's
    /// namespace placeholders, then the global ones.
    pub fn format<I, K, V>(&self, key: &str, values: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let mut lookup = self.global.clone();
        if let Some(scoped) = self.namespaced.get(namespace_of(key)) {
            lookup.extend(scoped.iter().map(|(name, value)| (name.clone(), value.clone())));
        }
        lookup.extend(values.into_iter().map(|(name, value)| (name.into(), value.to_string())));

        let template = self.raw(key).replace("{{", LEFT_BRACE).replace("}}", RIGHT_BRACE);
        expand(&template, &lookup, MAX_PLACEHOLDER_DEPTH)
            .replace(LEFT_BRACE, "{")
            .replace(RIGHT_BRACE, "}")
    }

    fn rebuild(&mut self, messages: BTreeMap<String, String>) {
        let mut global = HashMap::new();
        let mut namespaced: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (key, value) in &messages {
            if let Some(name) = key.strip_prefix(PLACEHOLDER_SEGMENT) {
                global.insert(name.to_string(), value.clone());
            } else if let Some((namespace, rest)) = key.split_once('.') {
                if let Some(name) = rest.strip_prefix(PLACEHOLDER_SEGMENT) {
                    namespaced
                        .entry(namespace.to_string())
                        .or_default()
                        .insert(name.to_string(), value.clone());
                }
            }
        }

        let global = expand_all(&global, &global);
        self.namespaced = namespaced
            .into_iter()
            .map(|(namespace, scoped)| {
                let mut visible = global.clone();
                visible.extend(scoped.iter().map(|(name, value)| (name.clone(), value.clone())));
                (namespace, expand_all(&scoped, &visible))
            })
            .collect();
        self.global = global;
        self.messages = messages;
        log::debug!(
            "Loaded {} messages, {} global placeholders",
            self.messages.len(),
            self.global.len()
        );
    }
}

fn namespace_of(key: &str) -> &str {
    key.split_once('.').map(|(namespace, _)| namespace).unwrap_or_default()
}

fn expand_all(source: &HashMap<String, String>, lookup: &HashMap<String, String>) -> HashMap<String, String> {
    source
        .iter()
        .map(|(name, value)| (name.clone(), expand(value, lookup, MAX_PLACEHOLDER_DEPTH)))
        .collect()
}

/// Replaces known placeholders, repeating while anything changed, at most
/// `depth` rounds.
fn expand(input: &str, lookup: &HashMap<String, String>, depth: usize) -> String {
    if depth == 0 || !input.contains('{') {
        return input.to_string();
    }
    let mut changed = false;
    let output = PLACEHOLDER.replace_all(input, |captures: &Captures<'_>| match lookup.get(&captures[1]) {
        Some(value) => {
            changed = true;
            value.clone()
        }
        None => captures[0].to_string(),
    });
    if changed {
        expand(&output, lookup, depth - 1)
    } else {
        output.into_owned()
    }
}

/// Dotted-path view of `data`. Lists become one line per item; nulls are
/// dropped.
fn flatten(data: &ConfigData) -> BTreeMap<String, String> {
    let mut messages = BTreeMap::new();
    for key in data.keys() {
        if let Some(value) = data.get_value(&key) {
            flatten_value(&key, value, &mut messages);
        }
    }
    messages
}

fn flatten_value(path: &str, value: &Value, messages: &mut BTreeMap<String, String>) {
    match value {
        Value::Null => {}
        Value::String(text) => {
            messages.insert(path.to_string(), text.clone());
        }
        Value::Object(table) => {
            for (key, nested) in table {
                flatten_value(&format!("{}.{}", path, key), nested, messages);
            }
        }
        Value::Array(items) => {
            let lines: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect();
            messages.insert(path.to_string(), lines.join("\n"));
        }
        other => {
            messages.insert(path.to_string(), other.to_string());
        }
    }
}
