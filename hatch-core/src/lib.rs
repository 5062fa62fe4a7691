//! hatch-core: Engine for fetching, loading, and activating native plugins
//!
//! This crate provides the host side of the hatch plugin system:
//!
//! - **Versions** - [`Version`] parsing and ordering for release tags
//! - **Registry** - [`PluginRegistry`] for the known plugins and the active one
//! - **Loading** - [`DynamicModuleLoader`] turns a shared library into a plugin
//! - **Distribution** - [`GitHubReleaseClient`] downloads and extracts releases
//! - **Capabilities** - [`TomlStore`], [`WorkspaceFiles`] and [`HeadlessDialog`]
//!   handed to plugins through [`hatch_plugin_api::HostCapabilities`]
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use hatch_core::{ConfigLoader, HeadlessDialog, Version, registry_from_config};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load()?;
//!     let mut registry = registry_from_config(&config, Arc::new(HeadlessDialog::new(true)))?;
//!
//!     let version: Version = "v1.0.0".parse()?;
//!     let (artifact, plugin) = registry
//!         .load_remote("https://github.com/org/hello", &version)
//!         .await?;
//!
//!     if let Some(plugin) = plugin {
//!         registry.use_plugin(&plugin)?;
//!     }
//!     println!("readme: {:?}", artifact.readme);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     PluginRegistry                       │
//! │  ┌────────────────────┐      ┌────────────────────────┐  │
//! │  │   RemoteFetcher    │      │      ModuleLoader      │  │
//! │  │  (single-flight)   │      │ (DynamicModuleLoader)  │  │
//! │  └─────────┬──────────┘      └───────────▲────────────┘  │
//! │            │ ReleaseArtifact.local_path  │               │
//! │            └─────────────────────────────┘               │
//! └────────────┬─────────────────────────────────────────────┘
//!              ▼
//!   GitHubReleaseClient: download -> extract -> readme
//! ```

pub mod config;
pub mod dialog;
pub mod error;
pub mod files;
pub mod host;
pub mod plugins;
pub mod presentation;
pub mod remote;
pub mod store;
pub mod version;

// Re-export key types for convenience
pub use config::{ConfigError, ConfigLoader, HostConfig};
pub use dialog::{DialogEvent, HeadlessDialog};
pub use error::HatchError;
pub use files::WorkspaceFiles;
pub use host::registry_from_config;
pub use plugins::{
    DynamicModuleLoader, LoadError, LoadOptions, LoadOutcome, LoadedModule, ModuleLoader,
    PluginDescriptor, PluginRegistry, RegistryError, RemoteFetcher,
};
pub use presentation::{Surface, settings_tabs, surface_for};
pub use remote::{
    ArchiveExtractor, FetchStage, GitHubReleaseClient, HttpClient, ReleaseArtifact, ReleaseSource,
    RemoteError,
};
pub use store::{MemoryStore, TomlStore};
pub use version::{Version, VersionError};
