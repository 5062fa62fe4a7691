//! Layered host configuration
//!
//! The user file (`~/.config/hatch/config.toml`) is read first, then the
//! project file (`.hatch/config.toml`); a value set in a later layer wins.

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{
    DEFAULT_API_HOST, DEFAULT_RAW_CONTENT_HOST, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    HostConfig, InstallSettings, LoadingSettings, RawHostConfig, RemoteSettings, StoreSettings,
};
