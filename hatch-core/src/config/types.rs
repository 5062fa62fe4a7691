use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Host for release assets and the repository URLs plugins point at
pub const DEFAULT_RAW_CONTENT_HOST: &str = "https://raw.githubusercontent.com";

/// Host for the releases API
pub const DEFAULT_API_HOST: &str = "https://api.github.com";

/// Request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("hatch/", env!("CARGO_PKG_VERSION"));

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHostConfig {
    #[serde(default)]
    pub remote: RawRemoteSettings,

    #[serde(default)]
    pub install: RawInstallSettings,

    #[serde(default)]
    pub loading: RawLoadingSettings,

    #[serde(default)]
    pub store: RawStoreSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRemoteSettings {
    pub raw_content_host: Option<String>,
    pub api_host: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawInstallSettings {
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawLoadingSettings {
    pub require_confirmation: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStoreSettings {
    pub path: Option<PathBuf>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HostConfig {
    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub install: InstallSettings,

    #[serde(default)]
    pub loading: LoadingSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

/// Where releases, readmes, and release listings come from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteSettings {
    /// Readmes are read from `{raw_content_host}/{owner}/{repo}/{version}/{name}`
    pub raw_content_host: String,

    /// Releases are listed from `{api_host}/repos/{owner}/{repo}/releases`
    pub api_host: String,

    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            raw_content_host: DEFAULT_RAW_CONTENT_HOST.to_string(),
            api_host: DEFAULT_API_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallSettings {
    /// Releases extract to `{root}/{owner}/{repo}/{version}`
    pub root: PathBuf,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            root: hatch_paths::plugins_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadingSettings {
    /// Ask before opening a fetched plugin library
    pub require_confirmation: bool,
}

impl Default for LoadingSettings {
    fn default() -> Self {
        Self {
            require_confirmation: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSettings {
    /// TOML file backing the persisted store
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: hatch_paths::store_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = HostConfig::default();
        assert_eq!(config.remote.raw_content_host, DEFAULT_RAW_CONTENT_HOST);
        assert_eq!(config.remote.api_host, DEFAULT_API_HOST);
        assert_eq!(config.remote.timeout_secs, 30);
        assert!(config.remote.user_agent.starts_with("hatch/"));
        assert!(config.loading.require_confirmation);
        assert!(config.install.root.ends_with("plugins"));
        assert!(config.store.path.ends_with("store.toml"));
    }

    #[test]
    fn test_raw_config_parses_partial_sections() {
        let raw: RawHostConfig = toml::from_str(
            r#"
            [remote]
            timeout_secs = 5

            [loading]
            require_confirmation = false
            "#,
        )
        .unwrap();

        assert_eq!(raw.remote.timeout_secs, Some(5));
        assert!(raw.remote.api_host.is_none());
        assert_eq!(raw.loading.require_confirmation, Some(false));
        assert!(raw.install.root.is_none());
    }

    #[test]
    fn test_empty_raw_config() {
        let raw: RawHostConfig = toml::from_str("").unwrap();
        assert!(raw.remote.raw_content_host.is_none());
        assert!(raw.store.path.is_none());
    }
}
