//! Turns a shared library on disk into a live plugin instance

use std::path::{Path, PathBuf};

use hatch_plugin_api::{
    API_VERSION, API_VERSION_SYMBOL, BUILDER_SYMBOL, HostCapabilities, Plugin, PluginBuilder,
};
use libloading::Library;

use super::error::LoadError;
use super::registry::PluginDescriptor;

/// A plugin instance and the library its code lives in.
///
/// `on_unload` runs when the module is dropped, then the instance is
/// dropped, then the library is closed.
pub struct LoadedModule {
    instance: Box<dyn Plugin>,
    library: Option<Library>,
    source: Option<PathBuf>,
}

impl LoadedModule {
    /// A module whose code is linked into the host
    pub fn in_process(instance: Box<dyn Plugin>) -> Self {
        Self {
            instance,
            library: None,
            source: None,
        }
    }

    fn from_library(instance: Box<dyn Plugin>, library: Library, source: PathBuf) -> Self {
        Self {
            instance,
            library: Some(library),
            source: Some(source),
        }
    }

    /// Snapshot of identity, manifest, and surfaces
    pub fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::of(self.instance.as_ref())
    }

    pub fn plugin(&self) -> &dyn Plugin {
        self.instance.as_ref()
    }

    pub fn plugin_mut(&mut self) -> &mut dyn Plugin {
        self.instance.as_mut()
    }

    /// Library path, for modules loaded from disk
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// True when the module keeps a library open
    pub fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }
}

impl From<Box<dyn Plugin>> for LoadedModule {
    fn from(instance: Box<dyn Plugin>) -> Self {
        Self::in_process(instance)
    }
}

impl Drop for LoadedModule {
    fn drop(&mut self) {
        // on_unload must run while the library is still mapped
        if let Err(e) = self.instance.on_unload() {
            tracing::warn!(
                plugin = %self.instance.manifest().bundle_identifier,
                error = %e,
                "Plugin on_unload returned error"
            );
        }
    }
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("id", &self.instance.id())
            .field("bundle_identifier", &self.instance.manifest().bundle_identifier)
            .field("source", &self.source)
            .finish()
    }
}

/// Produces plugin instances from library paths
pub trait ModuleLoader: Send + Sync {
    /// Open the library at `path` and build its plugin with `capabilities`
    fn load(&self, path: &Path, capabilities: HostCapabilities) -> Result<LoadedModule, LoadError>;
}

/// [`ModuleLoader`] for native shared libraries exporting
/// `_hatch_plugin_builder` (see `hatch_plugin_api::export_plugin!`)
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicModuleLoader;

impl DynamicModuleLoader {
    pub fn new() -> Self {
        Self
    }

    #[cfg(unix)]
    fn open(path: &Path) -> Result<Library, libloading::Error> {
        use libloading::os::unix::{Library as UnixLibrary, RTLD_LOCAL, RTLD_NOW};
        // SAFETY: Loading runs the library's initializers. The user chose
        // to load this plugin and plugins run with full host privileges.
        unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_LOCAL) }.map(Library::from)
    }

    #[cfg(not(unix))]
    fn open(path: &Path) -> Result<Library, libloading::Error> {
        // SAFETY: see the unix variant
        unsafe { Library::new(path) }
    }
}

impl ModuleLoader for DynamicModuleLoader {
    fn load(&self, path: &Path, capabilities: HostCapabilities) -> Result<LoadedModule, LoadError> {
        let library = Self::open(path).map_err(|e| LoadError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let missing = |symbol: &'static str| {
            let path = path.to_path_buf();
            move |e: libloading::Error| LoadError::SymbolMissing {
                path,
                symbol,
                reason: e.to_string(),
            }
        };

        // SAFETY: The symbol is emitted by export_plugin! with this signature.
        let api_version_fn: libloading::Symbol<extern "C" fn() -> u32> =
            unsafe { library.get(API_VERSION_SYMBOL.as_bytes()) }
                .map_err(missing(API_VERSION_SYMBOL))?;

        let found = api_version_fn();
        if found != API_VERSION {
            return Err(LoadError::ApiVersionMismatch {
                expected: API_VERSION,
                found,
            });
        }

        // SAFETY: The symbol is emitted by export_plugin! with this signature,
        // and the plugin was built against the same API version.
        let builder_fn: libloading::Symbol<extern "C" fn() -> *mut dyn PluginBuilder> =
            unsafe { library.get(BUILDER_SYMBOL.as_bytes()) }.map_err(missing(BUILDER_SYMBOL))?;

        let raw = builder_fn();
        if raw.is_null() {
            return Err(LoadError::NullBuilder {
                path: path.to_path_buf(),
            });
        }

        // SAFETY: export_plugin! hands over a pointer from Box::into_raw,
        // and ownership is taken exactly once here.
        let builder = unsafe { Box::from_raw(raw) };
        let instance = builder.build(capabilities);

        tracing::info!(
            plugin = %instance.manifest().bundle_identifier,
            path = %path.display(),
            "Loaded plugin library"
        );

        Ok(LoadedModule::from_library(
            instance,
            library,
            path.to_path_buf(),
        ))
    }
}
