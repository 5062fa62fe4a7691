//! Capability handles - a plugin's interface to the host
//!
//! Plugins never reach for globals. At construction time the host hands a
//! [`HostCapabilities`] bundle to the plugin's builder, and everything the
//! plugin may touch outside itself goes through these handles:
//!
//! - [`FileAccess`]: a user-chosen workspace directory and file IO within it
//! - [`Dialog`]: confirmations, alerts, and directory pickers
//! - [`Store`]: the persisted key-value store

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::PluginError;
use crate::store::{ScopedStore, Store, StoreScope};

// ─── Dialog ──────────────────────────────────────────────────────────

/// Visual weight of a dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlertStyle {
    #[default]
    Informational,
    Warning,
    Critical,
}

/// A yes/no question for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirm {
    pub title: String,
    pub subtitle: String,
    pub confirm_text: String,
    pub cancel_text: String,
    pub style: AlertStyle,
}

impl Confirm {
    /// Confirmation with "Confirm"/"Cancel" buttons
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            confirm_text: "Confirm".to_string(),
            cancel_text: "Cancel".to_string(),
            style: AlertStyle::Informational,
        }
    }

    /// Builder: set the style
    pub fn with_style(mut self, style: AlertStyle) -> Self {
        self.style = style;
        self
    }
}

/// A notice the user acknowledges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub subtitle: String,
    pub ok_text: String,
    pub style: AlertStyle,
}

impl Alert {
    /// Alert with an "OK" button
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            ok_text: "OK".to_string(),
            style: AlertStyle::Critical,
        }
    }

    /// Builder: set the style
    pub fn with_style(mut self, style: AlertStyle) -> Self {
        self.style = style;
        self
    }
}

/// Native dialog capability
pub trait Dialog: Send + Sync {
    /// Ask the user a yes/no question. Returns true on confirm.
    fn confirm(&self, request: &Confirm) -> bool;

    /// Show a notice
    fn alert(&self, request: &Alert);

    /// Ask the user to pick a directory. `None` when dismissed.
    fn pick_directory(&self, title: &str) -> Option<PathBuf>;
}

// ─── File access ─────────────────────────────────────────────────────

/// Workspace-scoped file access capability
pub trait FileAccess: Send + Sync {
    /// Ask the user for a workspace directory and make it current.
    ///
    /// Fails with [`PluginError::UserCancelled`] if the picker is dismissed.
    fn choose_workspace(&self) -> Result<PathBuf, PluginError>;

    /// Make `path` the current workspace.
    ///
    /// Fails with [`PluginError::FileNotFound`] if `path` is not a directory.
    fn set_workspace(&self, path: &Path) -> Result<(), PluginError>;

    /// The current workspace, if one has been chosen
    fn current_workspace(&self) -> Option<PathBuf>;

    /// Names of the entries in the current workspace.
    ///
    /// Fails with [`PluginError::NoSelectedDir`] if no workspace is set.
    fn list(&self) -> Result<Vec<String>, PluginError>;

    /// Read a file
    fn read(&self, path: &Path) -> Result<Vec<u8>, PluginError>;

    /// Write a file, replacing its contents
    fn write(&self, path: &Path, content: &str) -> Result<(), PluginError>;

    /// Create a directory and any missing parents
    fn create_dirs(&self, path: &Path) -> Result<(), PluginError>;

    /// Delete a file or directory tree
    fn delete(&self, path: &Path) -> Result<(), PluginError>;
}

// ─── Bundle ──────────────────────────────────────────────────────────

/// The capability handles a host injects into every plugin it builds
#[derive(Clone)]
pub struct HostCapabilities {
    pub files: Arc<dyn FileAccess>,
    pub dialog: Arc<dyn Dialog>,
    pub store: Arc<dyn Store>,
}

impl HostCapabilities {
    /// Bundle the three handles
    pub fn new(
        files: Arc<dyn FileAccess>,
        dialog: Arc<dyn Dialog>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            files,
            dialog,
            store,
        }
    }

    /// Store handle bound to a plugin's own namespace
    pub fn scoped_store(&self, bundle_id: &str) -> ScopedStore {
        ScopedStore::new(
            self.store.clone(),
            StoreScope::Plugin(bundle_id.to_string()),
        )
    }

    /// Store handle bound to the global namespace
    pub fn global_store(&self) -> ScopedStore {
        ScopedStore::new(self.store.clone(), StoreScope::Global)
    }
}

impl fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCapabilities").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_traits_are_object_safe() {
        fn _takes_dialog(_: Arc<dyn Dialog>) {}
        fn _takes_files(_: Arc<dyn FileAccess>) {}
    }

    #[test]
    fn test_confirm_defaults() {
        let confirm = Confirm::new("You are going to load plugin", "/tmp/libx.so");
        assert_eq!(confirm.confirm_text, "Confirm");
        assert_eq!(confirm.cancel_text, "Cancel");
        assert_eq!(confirm.style, AlertStyle::Informational);

        let confirm = confirm.with_style(AlertStyle::Critical);
        assert_eq!(confirm.style, AlertStyle::Critical);
    }

    #[test]
    fn test_alert_defaults() {
        let alert = Alert::new("Cancelled", "Cancelled loading the plugin");
        assert_eq!(alert.ok_text, "OK");
        assert_eq!(alert.style, AlertStyle::Critical);
        assert_eq!(
            alert.with_style(AlertStyle::Informational).style,
            AlertStyle::Informational
        );
    }
}
