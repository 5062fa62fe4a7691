//! Registry lifecycle with in-process plugins and a store on disk

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use hatch_core::presentation::{PLACEHOLDER, SETTINGS_PROMPT};
use hatch_core::{
    DynamicModuleLoader, HeadlessDialog, LoadOptions, PluginRegistry, RegistryError,
    ReleaseArtifact, ReleaseSource, RemoteError, Surface, TomlStore, Version, WorkspaceFiles,
    settings_tabs, surface_for,
};
use hatch_plugin_api::{
    HostCapabilities, Plugin, PluginBuilder, PluginManifest, ScopedStore, Surfaces,
};
use tempfile::TempDir;
use uuid::Uuid;

/// Source for registries that never go remote
struct Offline;

#[async_trait]
impl ReleaseSource for Offline {
    async fn fetch(&self, _url: &str, _version: &Version) -> Result<ReleaseArtifact, RemoteError> {
        Err(RemoteError::Transport("offline".to_string()))
    }

    async fn list_versions(&self, _url: &str) -> Result<Vec<Version>, RemoteError> {
        Err(RemoteError::Transport("offline".to_string()))
    }
}

/// Counts activations in its own store namespace
struct Counter {
    id: Uuid,
    bundle: String,
    name: String,
    surfaces: Surfaces,
    store: ScopedStore,
    uses: u64,
}

impl Plugin for Counter {
    fn id(&self) -> Uuid {
        self.id
    }

    fn manifest(&self) -> PluginManifest {
        PluginManifest::new(&self.bundle, &self.name, "tests")
    }

    fn surfaces(&self) -> Surfaces {
        self.surfaces
    }

    fn setup(&mut self) {
        self.uses = self.store.get("uses").unwrap_or(0);
    }

    fn on_use(&mut self) {
        self.uses += 1;
        self.store.set("uses", self.uses).unwrap();
    }
}

struct CounterBuilder {
    bundle: &'static str,
    name: &'static str,
    surfaces: Surfaces,
}

impl CounterBuilder {
    fn boxed(bundle: &'static str, name: &'static str, surfaces: Surfaces) -> Box<dyn PluginBuilder> {
        Box::new(Self {
            bundle,
            name,
            surfaces,
        })
    }
}

impl PluginBuilder for CounterBuilder {
    fn build(self: Box<Self>, capabilities: HostCapabilities) -> Box<dyn Plugin> {
        Box::new(Counter {
            id: Uuid::new_v4(),
            bundle: self.bundle.to_string(),
            name: self.name.to_string(),
            surfaces: self.surfaces,
            store: capabilities.scoped_store(self.bundle),
            uses: 0,
        })
    }
}

fn registry(store_path: PathBuf, approve: bool) -> PluginRegistry {
    let dialog = Arc::new(HeadlessDialog::new(approve));
    let capabilities = HostCapabilities::new(
        Arc::new(WorkspaceFiles::new(dialog.clone())),
        dialog,
        Arc::new(TomlStore::open(store_path).unwrap()),
    );
    PluginRegistry::new(
        Arc::new(DynamicModuleLoader::new()),
        Arc::new(Offline),
        capabilities,
    )
}

fn uses(registry: &PluginRegistry, bundle: &str) -> Option<u64> {
    registry
        .capabilities()
        .scoped_store(bundle)
        .get("uses")
}

#[test]
fn test_bundle_identifiers_stay_unique() {
    let dir = TempDir::new().unwrap();
    let mut registry = registry(dir.path().join("store.toml"), true);

    assert!(registry.add_from_builder(CounterBuilder::boxed("com.a", "A", Surfaces::view())));
    assert!(!registry.add_from_builder(CounterBuilder::boxed("com.a", "Other A", Surfaces::none())));
    assert!(registry.add_from_builder(CounterBuilder::boxed("com.b", "B", Surfaces::settings())));

    let names: Vec<&str> = registry.list().map(|p| p.display_name()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn test_activation_and_removal() {
    let dir = TempDir::new().unwrap();
    let mut registry = registry(dir.path().join("store.toml"), true);
    registry.add_from_builder(CounterBuilder::boxed("com.a", "A", Surfaces::view()));
    registry.add_from_builder(CounterBuilder::boxed("com.b", "B", Surfaces::settings()));
    registry.add_from_builder(CounterBuilder::boxed("com.c", "C", Surfaces::none()));

    assert_eq!(surface_for(registry.active()), Surface::Nothing);

    registry.use_by_name("B").unwrap();
    let b = registry.get("com.b").unwrap().clone();
    assert_eq!(registry.active(), Some(&b));
    assert_eq!(surface_for(registry.active()), Surface::SettingsPrompt(b.id));

    registry.use_by_bundle_id("com.c").unwrap();
    assert_eq!(surface_for(registry.active()), Surface::Placeholder);

    registry.use_by_bundle_id("com.a").unwrap();
    let a = registry.get("com.a").unwrap().clone();
    assert_eq!(surface_for(registry.active()), Surface::View(a.id));

    // Removing another plugin keeps the active one
    registry.remove("com.b").unwrap();
    assert_eq!(registry.active().map(|p| p.id), Some(a.id));

    // Removing the active plugin clears it
    registry.remove_plugin(&a);
    assert!(registry.active().is_none());
    assert_eq!(registry.len(), 1);

    // The removed plugin cannot be used again
    assert!(matches!(
        registry.use_plugin(&a),
        Err(RegistryError::PluginNotFoundById(id)) if id == a.id
    ));
    assert!(matches!(
        registry.remove("com.a"),
        Err(RegistryError::PluginNotFoundByBundleId(_))
    ));
    assert!(registry.active().is_none());
}

#[test]
fn test_settings_tabs_follow_registry_order() {
    let dir = TempDir::new().unwrap();
    let mut registry = registry(dir.path().join("store.toml"), true);
    registry.add_from_builder(CounterBuilder::boxed("com.z", "Z", Surfaces::settings()));
    registry.add_from_builder(CounterBuilder::boxed("com.v", "V", Surfaces::view()));
    registry.add_from_builder(CounterBuilder::boxed("com.a", "A", Surfaces::all()));

    let tabs: Vec<&str> = settings_tabs(registry.list())
        .into_iter()
        .map(|p| p.bundle_identifier())
        .collect();
    assert_eq!(tabs, vec!["com.z", "com.a"]);
    assert!(!SETTINGS_PROMPT.is_empty());
    assert!(!PLACEHOLDER.is_empty());
}

#[test]
fn test_plugin_state_survives_a_new_registry() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("store.toml");

    {
        let mut registry = registry(store_path.clone(), true);
        registry.add_from_builder(CounterBuilder::boxed("com.a", "A", Surfaces::view()));
        registry.use_by_bundle_id("com.a").unwrap();
        registry.use_by_bundle_id("com.a").unwrap();
        assert_eq!(uses(&registry, "com.a"), Some(2));
    }

    let mut registry = registry(store_path, true);
    registry.add_from_builder(CounterBuilder::boxed("com.a", "A", Surfaces::view()));
    registry.use_by_bundle_id("com.a").unwrap();
    assert_eq!(uses(&registry, "com.a"), Some(3));
    // Other namespaces see nothing
    assert_eq!(uses(&registry, "com.b"), None);
}

#[test]
fn test_load_missing_library_leaves_registry_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut registry = registry(dir.path().join("store.toml"), true);
    registry.add_from_builder(CounterBuilder::boxed("com.a", "A", Surfaces::view()));
    registry.use_by_bundle_id("com.a").unwrap();

    let result = registry.load(
        &dir.path().join("libmissing.so"),
        LoadOptions::default().confirmed(),
    );

    assert!(matches!(result, Err(RegistryError::Load(_))));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.active().map(|p| p.bundle_identifier()), Some("com.a"));
}

#[test]
fn test_declined_load_never_opens_the_library() {
    let dir = TempDir::new().unwrap();
    let mut registry = registry(dir.path().join("store.toml"), false);

    // The path does not exist; declining must return before opening it
    let result = registry.load(&dir.path().join("libmissing.so"), LoadOptions::default());

    assert!(matches!(result, Ok(None)));
    assert!(registry.is_empty());
}
