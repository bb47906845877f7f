use std::any::Any;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::event::Event;

/// A host event identified by name and carrying a JSON payload.
///
/// Hosts with their own event types implement [`Event`] directly; this type
/// covers events that only need a name and a few fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEvent {
    name: String,
    payload: Map<String, Value>,
}

impl ServerEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Map::new(),
        }
    }

    /// Adds a payload field, replacing an existing one with the same key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Typed access to a payload field; `None` if absent or of another shape.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.payload
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl Event for ServerEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
