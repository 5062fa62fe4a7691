//! Error types for plugin authors and capability handles

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced through the capability handles a host gives to plugins
#[derive(Error, Debug)]
pub enum PluginError {
    /// A workspace operation was attempted before a directory was chosen
    #[error("No directory selected")]
    NoSelectedDir,

    /// The referenced file or directory does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The user dismissed a dialog
    #[error("User cancelled")]
    UserCancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted store failure (read or write)
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl PluginError {
    /// Create a custom error with a message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }
}
