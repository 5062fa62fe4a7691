//! Assembling a registry from host configuration

use std::sync::Arc;
use std::time::Duration;

use hatch_plugin_api::{Dialog, HostCapabilities, Store};

use crate::config::HostConfig;
use crate::error::HatchError;
use crate::files::WorkspaceFiles;
use crate::plugins::{DynamicModuleLoader, PluginRegistry};
use crate::remote::{GitHubReleaseClient, ReqwestHttp};
use crate::store::TomlStore;

/// Registry wired to the real filesystem, network, and dynamic loader.
///
/// The dialog is the one collaborator a host always brings itself.
pub fn registry_from_config(
    config: &HostConfig,
    dialog: Arc<dyn Dialog>,
) -> Result<PluginRegistry, HatchError> {
    let store: Arc<dyn Store> = Arc::new(TomlStore::open(&config.store.path)?);
    let http = ReqwestHttp::new(
        Duration::from_secs(config.remote.timeout_secs),
        &config.remote.user_agent,
    )?;
    let source = GitHubReleaseClient::new(
        Arc::new(http),
        store.clone(),
        config.remote.clone(),
        config.install.root.clone(),
    );
    let capabilities = HostCapabilities::new(
        Arc::new(WorkspaceFiles::new(dialog.clone())),
        dialog,
        store,
    );

    tracing::debug!(
        store = %config.store.path.display(),
        install_root = %config.install.root.display(),
        "Plugin registry configured"
    );

    Ok(PluginRegistry::new(
        Arc::new(DynamicModuleLoader::new()),
        Arc::new(source),
        capabilities,
    )
    .with_confirmation(config.loading.require_confirmation))
}
