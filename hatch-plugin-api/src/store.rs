//! Persisted key-value store handed to plugins
//!
//! Keys are a composite of a scope and a name. A value written under one
//! plugin's scope cannot be read through another plugin's scope or through
//! the global scope, because the scope is part of the key type rather than
//! a string prefix.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::PluginError;

/// Namespace a store key lives in
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreScope {
    /// Host-wide settings (credentials, host preferences)
    Global,
    /// Settings owned by the plugin with this bundle identifier
    Plugin(String),
}

/// Composite store key: `(scope, key)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey {
    pub scope: StoreScope,
    pub key: String,
}

impl StoreKey {
    /// Key in the global scope
    pub fn global(key: impl Into<String>) -> Self {
        Self {
            scope: StoreScope::Global,
            key: key.into(),
        }
    }

    /// Key in a plugin's scope
    pub fn plugin(bundle_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            scope: StoreScope::Plugin(bundle_id.into()),
            key: key.into(),
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            StoreScope::Global => write!(f, "{}", self.key),
            StoreScope::Plugin(bundle_id) => write!(f, "{}::{}", bundle_id, self.key),
        }
    }
}

/// Persisted key-value store capability.
///
/// Implementations must be safe to call from any thread, but callers are not
/// expected to race writes to the same key.
pub trait Store: Send + Sync {
    /// Read a value
    fn get(&self, key: &StoreKey) -> Option<toml::Value>;

    /// Write a value, replacing any previous one
    fn set(&self, key: StoreKey, value: toml::Value) -> Result<(), PluginError>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &StoreKey) -> Result<(), PluginError>;
}

/// Typed helpers over any [`Store`]
pub trait StoreExt: Store {
    /// Read and deserialize a value; `None` if missing or of the wrong shape
    fn get_as<T: DeserializeOwned>(&self, key: &StoreKey) -> Option<T> {
        match self.get(key)?.try_into() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Stored value has an unexpected shape");
                None
            }
        }
    }

    /// Serialize and write a value
    fn set_as<T: Serialize>(&self, key: StoreKey, value: T) -> Result<(), PluginError> {
        let value =
            toml::Value::try_from(value).map_err(|e| PluginError::Serialization(e.to_string()))?;
        self.set(key, value)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// A store handle pinned to one scope
#[derive(Clone)]
pub struct ScopedStore {
    store: Arc<dyn Store>,
    scope: StoreScope,
}

impl ScopedStore {
    /// Bind `store` to `scope`
    pub fn new(store: Arc<dyn Store>, scope: StoreScope) -> Self {
        Self { store, scope }
    }

    /// The scope every key goes through
    pub fn scope(&self) -> &StoreScope {
        &self.scope
    }

    fn key(&self, key: &str) -> StoreKey {
        StoreKey {
            scope: self.scope.clone(),
            key: key.to_string(),
        }
    }

    /// Read and deserialize a value in this scope
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.store.get_as(&self.key(key))
    }

    /// Serialize and write a value in this scope
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<(), PluginError> {
        self.store.set_as(self.key(key), value)
    }

    /// Remove a value in this scope
    pub fn remove(&self, key: &str) -> Result<(), PluginError> {
        self.store.remove(&self.key(key))
    }
}

impl fmt::Debug for ScopedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedStore")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
