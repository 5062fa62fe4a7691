//! Error types for hatch-core

use thiserror::Error;

use crate::config::ConfigError;
use crate::plugins::{LoadError, RegistryError};
use crate::remote::RemoteError;
use crate::version::VersionError;

pub use hatch_plugin_api::PluginError;

/// Top-level error type for hatch-core
#[derive(Error, Debug)]
pub enum HatchError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),
}
