//! Plugin loading and registry error types

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::remote::RemoteError;

/// Errors from opening a plugin library
#[derive(Error, Debug)]
pub enum LoadError {
    /// The library could not be opened (missing, wrong format, wrong arch)
    #[error("Failed to open plugin library {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    /// A required entry symbol is not exported
    #[error("Plugin library {path} does not export {symbol}: {reason}")]
    SymbolMissing {
        path: PathBuf,
        symbol: &'static str,
        reason: String,
    },

    /// API version mismatch between host and plugin
    #[error("API version mismatch: host expects {expected}, plugin has {found}")]
    ApiVersionMismatch { expected: u32, found: u32 },

    /// The entry symbol returned no builder
    #[error("Plugin library {path} returned a null builder")]
    NullBuilder { path: PathBuf },
}

/// Errors from registry operations
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    #[error("Plugin not found with id {0}")]
    PluginNotFoundById(Uuid),

    #[error("Plugin not found with bundle identifier {0}")]
    PluginNotFoundByBundleId(String),

    #[error("Plugin not found with name {0}")]
    PluginNotFoundByName(String),

    #[error("Load error: {0}")]
    Load(Arc<LoadError>),

    /// Shared by every caller of a coalesced fetch
    #[error("Remote error: {0}")]
    Remote(Arc<RemoteError>),
}

impl From<LoadError> for RegistryError {
    fn from(err: LoadError) -> Self {
        Self::Load(Arc::new(err))
    }
}

impl From<RemoteError> for RegistryError {
    fn from(err: RemoteError) -> Self {
        Self::Remote(Arc::new(err))
    }
}

impl From<Arc<RemoteError>> for RegistryError {
    fn from(err: Arc<RemoteError>) -> Self {
        Self::Remote(err)
    }
}
