//! The trait a plugin crate implements to hand itself to the engine.
//!
//! A [`KilnPlugin`] names itself, states which engine APIs it runs against,
//! lists its code units and binds the services those units depend on.
//! [`KilnPlugin::context`] turns all of that into a [`PluginContext`] ready for
//! [`crate::LifecycleController::start`].
use crate::config::ConfigSource;
use crate::error::Result;
use crate::injection::Injector;
use crate::lifecycle::PluginContext;
use crate::scanner::CodeUnit;
use crate::version::{VersionRange, parse_version};

pub trait KilnPlugin: Send + Sync {
    /// The name of the plugin
    fn name(&self) -> &'static str;

    /// The version of the plugin, as a semver string
    fn version(&self) -> &str;

    /// Compatible API versions. An empty list accepts every API.
    fn compatible_api_versions(&self) -> Vec<VersionRange>;

    /// The plugin's declarations, grouped by code unit
    fn code_units(&self) -> Vec<CodeUnit>;

    /// Binds the services the plugin's capabilities depend on.
    fn bind_services(&self, _injector: &mut Injector) {}

    /// A ready-to-start context with its own container and `config`.
    ///
    /// Fails when [`KilnPlugin::version`] is not a valid version.
    fn context(&self, config: impl ConfigSource + 'static) -> Result<PluginContext>
    where
        Self: Sized,
    {
        let mut injector = Injector::new();
        self.bind_services(&mut injector);

        let context = PluginContext::new(self.name(), self.code_units())
            .with_version(parse_version(self.version())?)
            .with_container(injector)
            .with_config(config);
        Ok(self
            .compatible_api_versions()
            .into_iter()
            .fold(context, PluginContext::compatible_with))
    }
}
