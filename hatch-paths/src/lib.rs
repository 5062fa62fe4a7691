//! XDG Base Directory paths for hatch.
//!
//! Hosts embedding hatch get the same layout on every platform:
//!
//! ```text
//! $XDG_CONFIG_HOME/hatch/config.toml     user configuration
//! $XDG_CONFIG_HOME/hatch/store.toml      persisted key-value store
//! $XDG_DATA_HOME/hatch/plugins/<owner>/<repo>/<version>/
//!                                        extracted plugin releases
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "hatch";

/// `$<env_var>/hatch`, else `~/<home_relative>/hatch`, else a relative
/// `<home_relative>/hatch` when no home directory is known.
fn xdg_dir(env_var: &str, home_relative: &str) -> PathBuf {
    let base = match std::env::var_os(env_var) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => match dirs::home_dir() {
            Some(home) => home.join(home_relative),
            None => PathBuf::from(home_relative),
        },
    };
    base.join(APP_DIR)
}

/// Get the hatch config directory.
///
/// Returns `$XDG_CONFIG_HOME/hatch` if set, otherwise `~/.config/hatch`.
///
/// # Examples
///
/// ```
/// use hatch_paths::config_dir;
///
/// let config = config_dir();
/// assert!(config.ends_with("hatch"));
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the hatch data directory.
///
/// Returns `$XDG_DATA_HOME/hatch` if set, otherwise `~/.local/share/hatch`.
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// User configuration file
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default location of the persisted store
pub fn store_file() -> PathBuf {
    config_dir().join("store.toml")
}

/// Root under which downloaded plugin releases are extracted
pub fn plugins_dir() -> PathBuf {
    data_dir().join("plugins")
}
