/// Framework name
pub const FRAMEWORK_NAME: &str = "Kiln";

/// Framework version
pub const FRAMEWORK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current plugin API version, checked against `PluginContext::compatible_api`
pub const API_VERSION: &str = "0.1.0";

/// Dependency keys with this prefix are served from the config schemas of the
/// same plugin instead of the injection container (`"config:greeter"`).
pub const CONFIG_DEPENDENCY_PREFIX: &str = "config:";

/// Upper bound on completions returned by a single suggestion request
pub const MAX_SUGGESTIONS: usize = 20;

/// Identity used for invocations that come from the server console
pub const CONSOLE_INVOKER: &str = "CONSOLE";

/// Rounds of placeholder expansion before a message is returned as is
pub const MAX_PLACEHOLDER_DEPTH: usize = 8;
