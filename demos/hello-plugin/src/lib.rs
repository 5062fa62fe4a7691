//! Hello Plugin - A simple example plugin for hatch
//!
//! This plugin demonstrates:
//! - Basic plugin structure with the `export_plugin!` macro
//! - Implementing the `Plugin` trait and declaring its surfaces
//! - Using the plugin's own store namespace across activations
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! ## Publishing
//!
//! Zip the library as `{os}_{arch}.zip` (e.g. `linux_x86.zip`) and attach it
//! to a GitHub release tagged with the plugin version.

use hatch_plugin_api::{
    HostCapabilities, Plugin, PluginBuilder, PluginError, PluginManifest, ScopedStore, Surfaces,
    export_plugin,
};
use uuid::Uuid;

const BUNDLE_ID: &str = "com.example.hello";

/// Counts how often the user has opened it.
pub struct HelloPlugin {
    id: Uuid,
    store: ScopedStore,
    uses: u64,
}

impl Plugin for HelloPlugin {
    fn id(&self) -> Uuid {
        self.id
    }

    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            short_description: "A simple example plugin that counts its uses".to_string(),
            repository: "https://github.com/hatch-rs/hello-plugin".to_string(),
            icon_hint: Some("hand.wave".to_string()),
            ..PluginManifest::new(BUNDLE_ID, "Hello", "hatch")
        }
    }

    fn surfaces(&self) -> Surfaces {
        Surfaces::all()
    }

    fn setup(&mut self) {
        self.uses = self.store.get("uses").unwrap_or(0);
    }

    fn on_use(&mut self) {
        self.uses += 1;
        tracing::info!(uses = self.uses, "Hello from the hello plugin");
        if let Err(e) = self.store.set("uses", self.uses) {
            tracing::warn!(error = %e, "Failed to persist use count");
        }
    }

    fn on_unload(&mut self) -> Result<(), PluginError> {
        tracing::info!(uses = self.uses, "Hello plugin unloading");
        Ok(())
    }
}

#[derive(Default)]
pub struct HelloBuilder;

impl PluginBuilder for HelloBuilder {
    fn build(self: Box<Self>, capabilities: HostCapabilities) -> Box<dyn Plugin> {
        Box::new(HelloPlugin {
            id: Uuid::new_v4(),
            store: capabilities.scoped_store(BUNDLE_ID),
            uses: 0,
        })
    }
}

export_plugin!(HelloBuilder);
