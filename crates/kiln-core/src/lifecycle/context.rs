use std::fmt;
use std::sync::Arc;

use semver::Version;

use crate::config::{ConfigData, ConfigSource};
use crate::injection::{Container, Injector};
use crate::scanner::CodeUnitSource;
use crate::version::VersionRange;

/// Everything the controller needs to know about one plugin.
#[derive(Clone)]
pub struct PluginContext {
    name: String,
    version: Version,
    compatible_api: Vec<VersionRange>,
    source: Arc<dyn CodeUnitSource>,
    container: Arc<dyn Container>,
    config: Arc<dyn ConfigSource>,
}

impl PluginContext {
    /// A context with an empty container and no configuration.
    pub fn new(name: impl Into<String>, source: impl CodeUnitSource + 'static) -> Self {
        Self {
            name: name.into(),
            version: Version::new(0, 0, 0),
            compatible_api: Vec::new(),
            source: Arc::new(source),
            container: Arc::new(Injector::new()),
            config: Arc::new(ConfigData::new()),
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Adds an accepted API range. Without any range every API is accepted.
    pub fn compatible_with(mut self, range: VersionRange) -> Self {
        self.compatible_api.push(range);
        self
    }

    pub fn with_container(mut self, container: impl Container + 'static) -> Self {
        self.container = Arc::new(container);
        self
    }

    pub fn with_shared_container(mut self, container: Arc<dyn Container>) -> Self {
        self.container = container;
        self
    }

    pub fn with_config(mut self, config: impl ConfigSource + 'static) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn compatible_api(&self) -> &[VersionRange] {
        &self.compatible_api
    }

    pub fn source(&self) -> &dyn CodeUnitSource {
        self.source.as_ref()
    }

    pub fn container(&self) -> &dyn Container {
        self.container.as_ref()
    }

    pub fn config(&self) -> &dyn ConfigSource {
        self.config.as_ref()
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("compatible_api", &self.compatible_api)
            .finish_non_exhaustive()
    }
}
