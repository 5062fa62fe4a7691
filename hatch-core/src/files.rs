//! Workspace file access handed to plugins
//!
//! Relative paths resolve against the current workspace; absolute paths are
//! used as given.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use hatch_plugin_api::{Dialog, FileAccess, PluginError};

/// [`FileAccess`] over the local filesystem
pub struct WorkspaceFiles {
    dialog: Arc<dyn Dialog>,
    workspace: RwLock<Option<PathBuf>>,
}

impl WorkspaceFiles {
    /// File access that asks `dialog` when a workspace must be chosen
    pub fn new(dialog: Arc<dyn Dialog>) -> Self {
        Self {
            dialog,
            workspace: RwLock::new(None),
        }
    }

    fn workspace(&self) -> Option<PathBuf> {
        self.workspace
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, PluginError> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        self.workspace()
            .map(|workspace| workspace.join(path))
            .ok_or(PluginError::NoSelectedDir)
    }

    fn existing(&self, path: &Path) -> Result<PathBuf, PluginError> {
        let resolved = self.resolve(path)?;
        if !resolved.exists() {
            return Err(PluginError::FileNotFound { path: resolved });
        }
        Ok(resolved)
    }
}

impl FileAccess for WorkspaceFiles {
    fn choose_workspace(&self) -> Result<PathBuf, PluginError> {
        let picked = self
            .dialog
            .pick_directory("Choose a workspace")
            .ok_or(PluginError::UserCancelled)?;
        self.set_workspace(&picked)?;
        Ok(picked)
    }

    fn set_workspace(&self, path: &Path) -> Result<(), PluginError> {
        if !path.is_dir() {
            return Err(PluginError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!(workspace = %path.display(), "Workspace set");
        *self.workspace.write().unwrap_or_else(|e| e.into_inner()) = Some(path.to_path_buf());
        Ok(())
    }

    fn current_workspace(&self) -> Option<PathBuf> {
        self.workspace()
    }

    fn list(&self) -> Result<Vec<String>, PluginError> {
        let workspace = self.workspace().ok_or(PluginError::NoSelectedDir)?;
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&workspace)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, PluginError> {
        Ok(std::fs::read(self.existing(path)?)?)
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), PluginError> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(resolved, content)?;
        Ok(())
    }

    fn create_dirs(&self, path: &Path) -> Result<(), PluginError> {
        std::fs::create_dir_all(self.resolve(path)?)?;
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<(), PluginError> {
        let resolved = self.existing(path)?;
        if resolved.is_dir() {
            std::fs::remove_dir_all(resolved)?;
        } else {
            std::fs::remove_file(resolved)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for WorkspaceFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceFiles")
            .field("workspace", &self.workspace())
            .finish_non_exhaustive()
    }
}
