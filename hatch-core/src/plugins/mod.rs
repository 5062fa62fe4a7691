//! Plugin system for hatch
//!
//! This module provides the infrastructure for loading and managing plugins:
//!
//! - [`PluginRegistry`]: The known plugins, the active one, and local and
//!   remote loading
//! - [`DynamicModuleLoader`]: Opens a plugin library and builds its plugin
//! - [`LoadError`] and [`RegistryError`]: Error types for plugin operations
//!
//! # Plugin Libraries
//!
//! A plugin library is a `cdylib` that calls
//! `hatch_plugin_api::export_plugin!` on its builder type. The loader checks
//! the exported API version, calls the builder with the host's capability
//! handles, and keeps the library open for as long as the plugin lives.
//!
//! # Example
//!
//! ```ignore
//! use hatch_core::plugins::{DynamicModuleLoader, LoadOptions, PluginRegistry};
//!
//! let mut registry = PluginRegistry::new(Arc::new(DynamicModuleLoader), source, capabilities);
//!
//! // Load, then use
//! registry.load(Path::new("/path/to/libhello.so"), LoadOptions::default())?;
//! registry.use_by_bundle_id("com.example.hello")?;
//!
//! // Fetch a release and load it
//! let (artifact, plugin) = registry
//!     .load_remote("https://github.com/org/hello", &"v1.0.0".parse()?)
//!     .await?;
//! ```

mod error;
mod loader;
mod registry;

pub use error::{LoadError, RegistryError};
pub use loader::{DynamicModuleLoader, LoadedModule, ModuleLoader};
pub use registry::{LoadOptions, LoadOutcome, PluginDescriptor, PluginRegistry, RemoteFetcher};
