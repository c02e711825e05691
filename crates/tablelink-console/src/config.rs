//! Configuration loading for the console.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use tablelink_config::Config;

use crate::errors::ConsoleError;

pub(crate) trait ConfigLoader {
    /// Loads configuration from the process arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, ConsoleError>;
}

/// Layers defaults, file, environment and CLI flags via `ortho_config`.
pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, ConsoleError> {
        Config::load_from_iter(args.iter().cloned()).map_err(ConsoleError::LoadConfiguration)
    }
}

/// Returns a fixed configuration regardless of arguments.
#[cfg(test)]
pub(crate) struct StaticConfigLoader(pub(crate) Config);

#[cfg(test)]
impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, ConsoleError> {
        Ok(self.0.clone())
    }
}
