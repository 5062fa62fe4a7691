//! Plugin registry - the known plugins and the one in use
//!
//! Plugins are kept in insertion order, unique by bundle identifier. The
//! active plugin is stored as an id and resolved against the list on every
//! access, so removing a plugin can never leave a stale active reference.
//!
//! The registry is owned by one task; mutations take `&mut self`. Remote
//! fetches go through a [`RemoteFetcher`], which can be cloned out of the
//! registry and shared across tasks.

use std::path::Path;
use std::sync::Arc;

use hatch_plugin_api::{
    Alert, AlertStyle, Confirm, HostCapabilities, Plugin, PluginBuilder, PluginManifest, Surfaces,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::RegistryError;
use super::loader::{LoadedModule, ModuleLoader};
use crate::remote::{FetchKey, ReleaseArtifact, ReleaseSource, RemoteError, SingleFlight};
use crate::version::Version;

/// Identity, manifest, and surfaces of a registered plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub id: Uuid,
    pub manifest: PluginManifest,
    pub surfaces: Surfaces,
}

impl PluginDescriptor {
    pub(crate) fn of(plugin: &dyn Plugin) -> Self {
        Self {
            id: plugin.id(),
            manifest: plugin.manifest(),
            surfaces: plugin.surfaces(),
        }
    }

    pub fn bundle_identifier(&self) -> &str {
        &self.manifest.bundle_identifier
    }

    pub fn display_name(&self) -> &str {
        &self.manifest.display_name
    }
}

/// Options for [`PluginRegistry::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Ask the user before opening the library
    pub require_confirmation: bool,
    /// Register the plugin once loaded
    pub auto_register: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            require_confirmation: true,
            auto_register: true,
        }
    }
}

impl LoadOptions {
    /// Builder: skip the confirmation prompt
    pub fn confirmed(mut self) -> Self {
        self.require_confirmation = false;
        self
    }

    /// Builder: hand the module back instead of registering it
    pub fn detached(mut self) -> Self {
        self.auto_register = false;
        self
    }
}

/// What [`PluginRegistry::load`] did with a loaded module
#[derive(Debug)]
pub enum LoadOutcome {
    /// Registered
    Registered(PluginDescriptor),
    /// A plugin with the same bundle identifier was already registered; the
    /// new module was dropped
    AlreadyRegistered(PluginDescriptor),
    /// Not registered; the caller owns the module
    Detached(LoadedModule),
}

impl LoadOutcome {
    pub fn descriptor(&self) -> PluginDescriptor {
        match self {
            Self::Registered(descriptor) | Self::AlreadyRegistered(descriptor) => {
                descriptor.clone()
            }
            Self::Detached(module) => module.descriptor(),
        }
    }
}

/// Fetches releases through a [`ReleaseSource`], coalescing identical
/// concurrent requests. Cheap to clone.
#[derive(Clone)]
pub struct RemoteFetcher {
    source: Arc<dyn ReleaseSource>,
    flight: Arc<SingleFlight>,
}

impl RemoteFetcher {
    pub fn new(source: Arc<dyn ReleaseSource>) -> Self {
        Self {
            source,
            flight: Arc::new(SingleFlight::new()),
        }
    }

    /// True while any fetch is in flight
    pub fn is_busy(&self) -> bool {
        self.flight.is_busy()
    }

    /// Fetch a release, or join the identical fetch already in flight
    pub async fn fetch(
        &self,
        repository_url: &str,
        version: &Version,
    ) -> Result<ReleaseArtifact, RegistryError> {
        check_url(repository_url)?;

        let source = Arc::clone(&self.source);
        let url = repository_url.to_string();
        let requested = version.clone();
        let artifact = self
            .flight
            .run(FetchKey::new(repository_url, version), async move {
                source.fetch(&url, &requested).await
            })
            .await?;
        Ok(artifact)
    }

    /// Versions published for a repository
    pub async fn list_versions(&self, repository_url: &str) -> Result<Vec<Version>, RegistryError> {
        check_url(repository_url)?;
        Ok(self.source.list_versions(repository_url).await?)
    }
}

fn check_url(repository_url: &str) -> Result<(), RemoteError> {
    url::Url::parse(repository_url)
        .map(|_| ())
        .map_err(|_| RemoteError::InvalidUrl {
            url: repository_url.to_string(),
        })
}

struct Entry {
    descriptor: PluginDescriptor,
    module: LoadedModule,
}

/// Registry of loaded plugins
pub struct PluginRegistry {
    entries: Vec<Entry>,
    active: Option<Uuid>,
    loader: Arc<dyn ModuleLoader>,
    remote: RemoteFetcher,
    capabilities: HostCapabilities,
    require_confirmation: bool,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new(
        loader: Arc<dyn ModuleLoader>,
        source: Arc<dyn ReleaseSource>,
        capabilities: HostCapabilities,
    ) -> Self {
        Self {
            entries: Vec::new(),
            active: None,
            loader,
            remote: RemoteFetcher::new(source),
            capabilities,
            require_confirmation: true,
        }
    }

    /// Builder: whether remote loads ask the user before opening the library
    pub fn with_confirmation(mut self, require_confirmation: bool) -> Self {
        self.require_confirmation = require_confirmation;
        self
    }

    /// Capability handles given to every plugin built by this registry
    pub fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    /// Handle for fetching releases outside of `&mut self`
    pub fn remote(&self) -> RemoteFetcher {
        self.remote.clone()
    }

    // ---- queries ----

    /// Registered plugins in insertion order
    pub fn list(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, bundle_id: &str) -> bool {
        self.position(bundle_id).is_some()
    }

    /// Descriptor of the plugin with this bundle identifier
    pub fn get(&self, bundle_id: &str) -> Option<&PluginDescriptor> {
        self.position(bundle_id)
            .map(|index| &self.entries[index].descriptor)
    }

    /// Instance of the plugin with this bundle identifier
    pub fn plugin(&self, bundle_id: &str) -> Option<&dyn Plugin> {
        self.position(bundle_id)
            .map(|index| self.entries[index].module.plugin())
    }

    /// The plugin in use, if any
    pub fn active(&self) -> Option<&PluginDescriptor> {
        self.active_entry().map(|entry| &entry.descriptor)
    }

    /// Instance of the plugin in use, if any
    pub fn active_plugin(&self) -> Option<&dyn Plugin> {
        self.active_entry().map(|entry| entry.module.plugin())
    }

    fn active_entry(&self) -> Option<&Entry> {
        let id = self.active?;
        self.entries.iter().find(|entry| entry.descriptor.id == id)
    }

    fn position(&self, bundle_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.descriptor.bundle_identifier() == bundle_id)
    }

    /// True while a remote fetch is in flight
    pub fn is_loading_remote(&self) -> bool {
        self.remote.is_busy()
    }

    // ---- registration ----

    /// Register a plugin.
    ///
    /// Returns `false`, and drops the module, when a plugin with the same
    /// bundle identifier is already registered.
    pub fn add(&mut self, module: impl Into<LoadedModule>) -> bool {
        let module = module.into();
        let descriptor = module.descriptor();

        if self.contains(descriptor.bundle_identifier()) {
            tracing::debug!(
                plugin = %descriptor.bundle_identifier(),
                "Plugin already registered, skipping"
            );
            return false;
        }

        tracing::info!(
            plugin = %descriptor.bundle_identifier(),
            name = %descriptor.display_name(),
            "Plugin registered"
        );
        self.entries.push(Entry { descriptor, module });
        true
    }

    /// Build a plugin with this registry's capabilities and register it
    pub fn add_from_builder(&mut self, builder: Box<dyn PluginBuilder>) -> bool {
        let instance = builder.build(self.capabilities.clone());
        self.add(instance)
    }

    /// Remove every plugin sharing the descriptor's bundle identifier
    pub fn remove_plugin(&mut self, descriptor: &PluginDescriptor) {
        self.remove_matching(descriptor.bundle_identifier());
    }

    /// Remove the plugin with this bundle identifier
    pub fn remove(&mut self, bundle_id: &str) -> Result<(), RegistryError> {
        if self.remove_matching(bundle_id) == 0 {
            return Err(RegistryError::PluginNotFoundByBundleId(
                bundle_id.to_string(),
            ));
        }
        Ok(())
    }

    fn remove_matching(&mut self, bundle_id: &str) -> usize {
        let active = self.active;
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());

        for entry in self.entries.drain(..) {
            if entry.descriptor.bundle_identifier() == bundle_id {
                removed.push(entry);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;

        if removed
            .iter()
            .any(|entry| Some(entry.descriptor.id) == active)
        {
            self.active = None;
        }

        let count = removed.len();
        if count > 0 {
            tracing::info!(plugin = %bundle_id, "Plugin removed");
        }
        // Modules unload here, after the registry is consistent again
        drop(removed);
        count
    }

    // ---- activation ----

    /// Use the plugin with this id
    pub fn use_by_id(&mut self, id: Uuid) -> Result<(), RegistryError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.descriptor.id == id)
            .ok_or(RegistryError::PluginNotFoundById(id))?;
        self.activate(index);
        Ok(())
    }

    /// Use the plugin with this bundle identifier
    pub fn use_by_bundle_id(&mut self, bundle_id: &str) -> Result<(), RegistryError> {
        let index = self
            .position(bundle_id)
            .ok_or_else(|| RegistryError::PluginNotFoundByBundleId(bundle_id.to_string()))?;
        self.activate(index);
        Ok(())
    }

    /// Use the first plugin with this display name
    pub fn use_by_name(&mut self, display_name: &str) -> Result<(), RegistryError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.descriptor.display_name() == display_name)
            .ok_or_else(|| RegistryError::PluginNotFoundByName(display_name.to_string()))?;
        self.activate(index);
        Ok(())
    }

    /// Use a registered plugin
    pub fn use_plugin(&mut self, descriptor: &PluginDescriptor) -> Result<(), RegistryError> {
        self.use_by_id(descriptor.id)
    }

    /// Run `setup` then `on_use` and make the plugin active.
    ///
    /// Hooks run on every call, including for the plugin already active.
    fn activate(&mut self, index: usize) {
        let entry = &mut self.entries[index];
        let plugin = entry.module.plugin_mut();
        plugin.setup();
        plugin.on_use();

        self.active = Some(entry.descriptor.id);
        tracing::info!(plugin = %entry.descriptor.bundle_identifier(), "Plugin activated");
    }

    /// Clear the active plugin
    pub fn deactivate(&mut self) {
        self.active = None;
    }

    // ---- loading ----

    /// Load a plugin library from disk.
    ///
    /// Returns `Ok(None)` when the user declines the confirmation prompt.
    pub fn load(
        &mut self,
        path: &Path,
        options: LoadOptions,
    ) -> Result<Option<LoadOutcome>, RegistryError> {
        if options.require_confirmation && !self.confirm_load(path) {
            tracing::info!(path = %path.display(), "Plugin load declined");
            self.capabilities.dialog.alert(
                &Alert::new("Cancelled", "Cancelled loading the plugin")
                    .with_style(AlertStyle::Informational),
            );
            return Ok(None);
        }

        let module = self
            .loader
            .load(path, self.capabilities.clone())
            .inspect_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "Failed to load plugin")
            })?;

        if !options.auto_register {
            return Ok(Some(LoadOutcome::Detached(module)));
        }

        let descriptor = module.descriptor();
        let outcome = if self.add(module) {
            LoadOutcome::Registered(descriptor)
        } else {
            LoadOutcome::AlreadyRegistered(descriptor)
        };
        Ok(Some(outcome))
    }

    fn confirm_load(&self, path: &Path) -> bool {
        let prompt = Confirm::new("You are going to load plugin", path.display().to_string())
            .with_style(AlertStyle::Critical);
        self.capabilities.dialog.confirm(&prompt)
    }

    /// Fetch a release and load it.
    ///
    /// The plugin is registered but not activated. The descriptor is `None`
    /// when the user declined the confirmation prompt.
    pub async fn load_remote(
        &mut self,
        repository_url: &str,
        version: &Version,
    ) -> Result<(ReleaseArtifact, Option<PluginDescriptor>), RegistryError> {
        let artifact = self.remote.fetch(repository_url, version).await?;
        let descriptor = self.load_artifact(&artifact)?;
        Ok((artifact, descriptor))
    }

    /// Fetch a release, remove the plugin it replaces, and load it
    pub async fn update_remote(
        &mut self,
        old_bundle_id: &str,
        repository_url: &str,
        version: &Version,
    ) -> Result<(ReleaseArtifact, Option<PluginDescriptor>), RegistryError> {
        let artifact = self.remote.fetch(repository_url, version).await?;
        self.remove(old_bundle_id)?;
        let descriptor = self.load_artifact(&artifact)?;
        Ok((artifact, descriptor))
    }

    fn load_artifact(
        &mut self,
        artifact: &ReleaseArtifact,
    ) -> Result<Option<PluginDescriptor>, RegistryError> {
        let options = LoadOptions {
            require_confirmation: self.require_confirmation,
            auto_register: true,
        };
        let outcome = self.load(&artifact.local_path, options)?;
        Ok(outcome.map(|outcome| outcome.descriptor()))
    }

    /// Versions published for a repository
    pub async fn list_versions(&self, repository_url: &str) -> Result<Vec<Version>, RegistryError> {
        self.remote.list_versions(repository_url).await
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field(
                "plugins",
                &self
                    .list()
                    .map(PluginDescriptor::bundle_identifier)
                    .collect::<Vec<_>>(),
            )
            .field("active", &self.active)
            .field("require_confirmation", &self.require_confirmation)
            .finish_non_exhaustive()
    }
}
