//! # Kiln Core Configuration
//!
//! [`ConfigData`] is the value model shared by the host, the engine and
//! plugins: a flat map of JSON values with codecs for JSON, YAML and TOML.
//! The engine only reads configuration through [`ConfigSource`]; hosts decide
//! where the data comes from. [`MessageCatalog`] reads a section as
//! user-facing text templates.
pub mod error;
pub mod messages;
pub mod schema;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use error::ConfigError;
pub use messages::MessageCatalog;
pub use schema::SchemaBinding;

/// File formats `ConfigData::load` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// `.toml`
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Picks the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

/// A table of configuration values keyed by field or section name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(flatten)]
    values: HashMap<String, Value>,
}

impl ConfigData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Typed lookup; `None` if the key is absent or the value has another shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), ConfigError> {
        let value = serde_json::to_value(value).map_err(|source| ConfigError::Value {
            key: key.to_string(),
            source,
        })?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copies every entry of `other` over this table.
    pub fn merge(&mut self, other: &ConfigData) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// The whole map as a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    pub fn serialize(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        let wrap = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Serialization {
            format: format.to_string(),
            source,
        };
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(&self).map_err(|e| wrap(e.into())),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(&self).map_err(|e| wrap(e.into())),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(&self).map_err(|e| wrap(e.into())),
        }
    }

    pub fn deserialize(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let wrap = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Deserialization {
            format: format.to_string(),
            source,
        };
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| wrap(e.into())),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| wrap(e.into())),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| wrap(e.into())),
        }
    }

    /// Reads a config file, picking the codec from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded {} config from {}", format, path.display());
        Self::deserialize(&data, format)
    }
}

/// Where the engine reads plugin configuration from.
///
/// A section is the table of values for one config schema identity.
pub trait ConfigSource: Send + Sync {
    /// `Ok(None)` when the source has nothing for `section`.
    fn section(&self, section: &str) -> Result<Option<ConfigData>, ConfigError>;
}

/// A `ConfigData` serves each top-level table as a section.
impl ConfigSource for ConfigData {
    fn section(&self, section: &str) -> Result<Option<ConfigData>, ConfigError> {
        match self.values.get(section) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(ConfigData::from_map(map.clone()))),
            Some(_) => Err(ConfigError::SectionNotTable {
                section: section.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests;
