//! Persisted key-value stores
//!
//! [`TomlStore`] keeps every value in one TOML file:
//!
//! ```toml
//! [global]
//! github_token = "..."
//!
//! [plugins."com.example.hello"]
//! greeting = "hi"
//! ```
//!
//! Every mutation is written through to disk before it returns.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use hatch_plugin_api::{PluginError, Store, StoreKey, StoreScope};
use serde::{Deserialize, Serialize};

type Table = BTreeMap<String, toml::Value>;

/// On-disk layout of the store file
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    global: Table,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    plugins: BTreeMap<String, Table>,
}

impl StoreFile {
    /// Load from a TOML file
    ///
    /// Returns an empty store if the file doesn't exist.
    fn load(path: &Path) -> Result<Self, PluginError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| PluginError::store(e.to_string()))
    }

    /// Save to a TOML file
    fn save(&self, path: &Path) -> Result<(), PluginError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| PluginError::Serialization(e.to_string()))?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    fn table(&self, scope: &StoreScope) -> Option<&Table> {
        match scope {
            StoreScope::Global => Some(&self.global),
            StoreScope::Plugin(bundle_id) => self.plugins.get(bundle_id),
        }
    }

    fn table_mut(&mut self, scope: &StoreScope) -> &mut Table {
        match scope {
            StoreScope::Global => &mut self.global,
            StoreScope::Plugin(bundle_id) => self.plugins.entry(bundle_id.clone()).or_default(),
        }
    }

    fn get(&self, key: &StoreKey) -> Option<toml::Value> {
        self.table(&key.scope)?.get(&key.key).cloned()
    }

    fn set(&mut self, key: StoreKey, value: toml::Value) {
        self.table_mut(&key.scope).insert(key.key, value);
    }

    fn remove(&mut self, key: &StoreKey) -> bool {
        match &key.scope {
            StoreScope::Global => self.global.remove(&key.key).is_some(),
            StoreScope::Plugin(bundle_id) => {
                let Some(table) = self.plugins.get_mut(bundle_id) else {
                    return false;
                };
                let removed = table.remove(&key.key).is_some();
                if table.is_empty() {
                    self.plugins.remove(bundle_id);
                }
                removed
            }
        }
    }
}

/// [`Store`] persisted to a TOML file
#[derive(Debug)]
pub struct TomlStore {
    path: PathBuf,
    data: Mutex<StoreFile>,
}

impl TomlStore {
    /// Open the store at `path`, reading any existing contents
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PluginError> {
        let path = path.into();
        let data = StoreFile::load(&path)?;
        tracing::debug!(path = %path.display(), "Opened store");
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// File backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn data(&self) -> MutexGuard<'_, StoreFile> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a mutation and write the result; memory is left untouched if
    /// the write fails.
    fn write_through(&self, mutate: impl FnOnce(&mut StoreFile) -> bool) -> Result<(), PluginError> {
        let mut data = self.data();
        let mut next = data.clone();
        if !mutate(&mut next) {
            return Ok(());
        }
        next.save(&self.path)?;
        *data = next;
        Ok(())
    }
}

impl Store for TomlStore {
    fn get(&self, key: &StoreKey) -> Option<toml::Value> {
        self.data().get(key)
    }

    fn set(&self, key: StoreKey, value: toml::Value) -> Result<(), PluginError> {
        tracing::debug!(key = %key, "Store set");
        self.write_through(|data| {
            data.set(key, value);
            true
        })
    }

    fn remove(&self, key: &StoreKey) -> Result<(), PluginError> {
        self.write_through(|data| data.remove(key))
    }
}

/// [`Store`] kept in memory only
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<StoreFile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, StoreFile> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &StoreKey) -> Option<toml::Value> {
        self.data().get(key)
    }

    fn set(&self, key: StoreKey, value: toml::Value) -> Result<(), PluginError> {
        self.data().set(key, value);
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> Result<(), PluginError> {
        self.data().remove(key);
        Ok(())
    }
}
