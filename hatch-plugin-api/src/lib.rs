//! hatch-plugin-api - Plugin API for the hatch plugin engine
//!
//! This crate provides the traits and types needed to write plugins that a
//! hatch host can load at runtime. Plugins are native Rust dynamic libraries
//! exporting a builder; the host calls the builder with its capability
//! handles and receives a live plugin instance.
//!
//! # Example
//!
//! ```ignore
//! use hatch_plugin_api::{
//!     export_plugin, HostCapabilities, Plugin, PluginBuilder, PluginManifest, Surfaces,
//! };
//! use uuid::Uuid;
//!
//! pub struct Hello {
//!     id: Uuid,
//!     caps: HostCapabilities,
//! }
//!
//! impl Plugin for Hello {
//!     fn id(&self) -> Uuid {
//!         self.id
//!     }
//!
//!     fn manifest(&self) -> PluginManifest {
//!         PluginManifest::new("com.example.hello", "Hello", "hatch")
//!     }
//!
//!     fn surfaces(&self) -> Surfaces {
//!         Surfaces::view()
//!     }
//! }
//!
//! #[derive(Default)]
//! pub struct HelloBuilder;
//!
//! impl PluginBuilder for HelloBuilder {
//!     fn build(self: Box<Self>, caps: HostCapabilities) -> Box<dyn Plugin> {
//!         Box::new(Hello { id: Uuid::new_v4(), caps })
//!     }
//! }
//!
//! export_plugin!(HelloBuilder);
//! ```

pub mod capabilities;
pub mod error;
pub mod store;
pub mod types;

pub use capabilities::{Alert, AlertStyle, Confirm, Dialog, FileAccess, HostCapabilities};
pub use error::PluginError;
pub use store::{ScopedStore, Store, StoreExt, StoreKey, StoreScope};
pub use types::*;

/// Current plugin API version. Plugins must match this exactly.
pub const API_VERSION: u32 = 1;

/// Exported symbol returning a `*mut dyn PluginBuilder`
pub const BUILDER_SYMBOL: &str = "_hatch_plugin_builder";

/// Exported symbol returning the plugin's [`API_VERSION`]
pub const API_VERSION_SYMBOL: &str = "_hatch_plugin_api_version";

/// The core plugin trait - implement this to create a hatch plugin.
///
/// Lifecycle hooks default to no-ops, so plugins only override the ones they
/// care about.
pub trait Plugin: Send + Sync {
    /// Stable identity of this instance
    fn id(&self) -> uuid::Uuid;

    /// Return plugin metadata
    fn manifest(&self) -> PluginManifest;

    /// Presentation surfaces this plugin offers
    fn surfaces(&self) -> Surfaces {
        Surfaces::none()
    }

    /// Called every time the host activates the plugin, before [`Plugin::on_use`]
    fn setup(&mut self) {}

    /// Called every time the host activates the plugin
    fn on_use(&mut self) {}

    /// Called before the host drops the plugin
    fn on_unload(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Materializes a plugin from the host's capability handles.
///
/// This is what a plugin library exports; see [`export_plugin!`].
pub trait PluginBuilder: Send {
    /// Consume the builder and produce the plugin
    fn build(self: Box<Self>, capabilities: HostCapabilities) -> Box<dyn Plugin>;
}

impl<F> PluginBuilder for F
where
    F: FnOnce(HostCapabilities) -> Box<dyn Plugin> + Send,
{
    fn build(self: Box<Self>, capabilities: HostCapabilities) -> Box<dyn Plugin> {
        (*self)(capabilities)
    }
}

/// Export a plugin builder type for dynamic loading.
///
/// The builder type must implement [`PluginBuilder`] and [`Default`].
///
/// # Usage
///
/// ```ignore
/// hatch_plugin_api::export_plugin!(MyPluginBuilder);
/// ```
///
/// # Generated Functions
///
/// - `_hatch_plugin_builder()`: Creates a new builder instance
/// - `_hatch_plugin_api_version()`: Returns the API version
#[macro_export]
macro_rules! export_plugin {
    ($builder_type:ty) => {
        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn _hatch_plugin_builder() -> *mut dyn $crate::PluginBuilder {
            let builder: Box<dyn $crate::PluginBuilder> = Box::new(<$builder_type>::default());
            Box::into_raw(builder)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _hatch_plugin_api_version() -> u32 {
            $crate::API_VERSION
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_is_set() {
        assert_eq!(API_VERSION, 1);
    }

    #[test]
    fn test_plugin_trait_is_object_safe() {
        // This compiles only if Plugin is object-safe
        fn _takes_boxed_plugin(_: Box<dyn Plugin>) {}
        fn _takes_boxed_builder(_: Box<dyn PluginBuilder>) {}
    }

    #[test]
    fn test_symbol_names_match_macro() {
        assert_eq!(BUILDER_SYMBOL, stringify!(_hatch_plugin_builder));
        assert_eq!(API_VERSION_SYMBOL, stringify!(_hatch_plugin_api_version));
    }
}
