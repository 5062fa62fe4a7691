use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::types::{
    DEFAULT_API_HOST, DEFAULT_RAW_CONTENT_HOST, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    HostConfig, InstallSettings, LoadingSettings, RawHostConfig, RawInstallSettings,
    RawLoadingSettings, RawRemoteSettings, RawStoreSettings, RemoteSettings, StoreSettings,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<HostConfig, ConfigError> {
        Self::load_from(Some(&Self::user_config_path()), &Self::project_config_path())
    }

    /// Load merged configuration from explicit layer paths.
    ///
    /// Missing files are skipped; later layers win.
    pub fn load_from(user: Option<&Path>, project: &Path) -> Result<HostConfig, ConfigError> {
        let mut raw = RawHostConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(user_path)?);
        }

        // Layer 2: Project config
        if project.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(project)?);
        }

        // Convert to final config with defaults applied
        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<RawHostConfig, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        hatch_paths::config_file()
    }

    /// Get project config path
    /// Can be overridden with HATCH_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("HATCH_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".hatch/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawHostConfig, overlay: RawHostConfig) -> RawHostConfig {
        RawHostConfig {
            remote: RawRemoteSettings {
                raw_content_host: overlay
                    .remote
                    .raw_content_host
                    .or(base.remote.raw_content_host),
                api_host: overlay.remote.api_host.or(base.remote.api_host),
                timeout_secs: overlay.remote.timeout_secs.or(base.remote.timeout_secs),
                user_agent: overlay.remote.user_agent.or(base.remote.user_agent),
            },
            install: RawInstallSettings {
                root: overlay.install.root.or(base.install.root),
            },
            loading: RawLoadingSettings {
                require_confirmation: overlay
                    .loading
                    .require_confirmation
                    .or(base.loading.require_confirmation),
            },
            store: RawStoreSettings {
                path: overlay.store.path.or(base.store.path),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawHostConfig) -> HostConfig {
        HostConfig {
            remote: RemoteSettings {
                raw_content_host: raw
                    .remote
                    .raw_content_host
                    .unwrap_or_else(|| DEFAULT_RAW_CONTENT_HOST.to_string()),
                api_host: raw
                    .remote
                    .api_host
                    .unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
                timeout_secs: raw.remote.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                user_agent: raw
                    .remote
                    .user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            },
            install: match raw.install.root {
                Some(root) => InstallSettings { root },
                None => InstallSettings::default(),
            },
            loading: LoadingSettings {
                require_confirmation: raw.loading.require_confirmation.unwrap_or(true),
            },
            store: match raw.store.path {
                Some(path) => StoreSettings { path },
                None => StoreSettings::default(),
            },
        }
    }

    /// Save config to a specific path
    ///
    /// Creates parent directories if they don't exist.
    pub fn save_to_path(config: &HostConfig, path: &Path) -> Result<(), ConfigError> {
        let io = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }

        let toml = toml::to_string_pretty(config)?;
        std::fs::write(path, toml).map_err(io)?;
        Ok(())
    }
}
