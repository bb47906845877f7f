use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ConfigData, ConfigError};

/// Checks that a merged config object fits the schema's backing type.
pub type SchemaValidator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Validator that tries to deserialize the object into `T`.
pub fn validator_for<T>() -> SchemaValidator
where
    T: DeserializeOwned + 'static,
{
    Arc::new(|value: &Value| {
        serde_json::from_value::<T>(value.clone())
            .map(|_| ())
            .map_err(|e| e.to_string())
    })
}

/// The constructed form of a config schema capability: the schema's defaults
/// merged with the plugin's section of the config source.
#[derive(Clone, PartialEq)]
pub struct SchemaBinding {
    identity: String,
    type_name: String,
    values: ConfigData,
}

impl SchemaBinding {
    /// Merges `section` over `defaults` and validates the result.
    ///
    /// Fields present in `section` win; defaults fill everything else.
    pub fn bind(
        identity: &str,
        type_name: &str,
        defaults: &ConfigData,
        section: Option<&ConfigData>,
        validator: &SchemaValidator,
    ) -> Result<Self, ConfigError> {
        let mut values = defaults.clone();
        if let Some(section) = section {
            values.merge(section);
        }
        validator(&values.to_value()).map_err(|message| ConfigError::SchemaMismatch {
            schema: identity.to_string(),
            type_name: type_name.to_string(),
            message,
        })?;
        Ok(Self {
            identity: identity.to_string(),
            type_name: type_name.to_string(),
            values,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Name of the backing type, as recorded by `backed_by::<T>()`
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn values(&self) -> &ConfigData {
        &self.values
    }

    pub fn get<T: DeserializeOwned>(&self, field: &str) -> Result<T, ConfigError> {
        let value = self
            .values
            .get_value(field)
            .ok_or_else(|| ConfigError::MissingField {
                schema: self.identity.clone(),
                field: field.to_string(),
            })?;
        serde_json::from_value(value.clone()).map_err(|source| ConfigError::FieldType {
            schema: self.identity.clone(),
            field: field.to_string(),
            source,
        })
    }

    pub fn get_or<T: DeserializeOwned>(&self, field: &str, default: T) -> T {
        self.values.get_or(field, default)
    }

    /// The whole binding as its backing type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        serde_json::from_value(self.values.to_value()).map_err(|e| ConfigError::SchemaMismatch {
            schema: self.identity.clone(),
            type_name: std::any::type_name::<T>().to_string(),
            message: e.to_string(),
        })
    }
}

impl fmt::Debug for SchemaBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBinding")
            .field("identity", &self.identity)
            .field("type_name", &self.type_name)
            .field("keys", &self.values.keys())
            .finish()
    }
}
