//! Centralized path resolution for rolesync
//!
//! Config and state live in the usual XDG locations, with environment
//! variable overrides so a dotfiles repo or CI job can point elsewhere.
//!
//! # Environment Variables
//!
//! - `ROLESYNC_CONFIG` - Path to the config file itself
//! - `ROLESYNC_CONFIG_DIR` - Override config directory
//! - `ROLESYNC_STATE_DIR` - Override state directory
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `ROLESYNC_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/rolesync` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\rolesync`
//!    - macOS/Linux: `~/.config/rolesync`
//!
//! For state_dir():
//! 1. `ROLESYNC_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/rolesync` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\rolesync`
//!    - macOS/Linux: `~/.local/state/rolesync`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for the config file path
pub const ENV_CONFIG: &str = "ROLESYNC_CONFIG";

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "ROLESYNC_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "ROLESYNC_STATE_DIR";

const APP_DIR: &str = "rolesync";

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "rolesync.toml";

/// State file name inside the state directory
pub const STATE_FILE: &str = "state.json";

/// Get the rolesync config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("Using config dir from {}: {}", ENV_CONFIG_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join(APP_DIR);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join(APP_DIR));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_DIR);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Get the rolesync state directory path
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join(APP_DIR);
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            return Ok(local_app_data.join(APP_DIR));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join(APP_DIR);
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// Resolve the config file: explicit flag, then `ROLESYNC_CONFIG`, then the config dir
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand(&path.to_string_lossy()));
    }
    if let Ok(file) = std::env::var(ENV_CONFIG) {
        return Ok(expand(&file));
    }
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Resolve the state file: explicit flag, then the state dir
pub fn state_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand(&path.to_string_lossy())),
        None => Ok(state_dir()?.join(STATE_FILE)),
    }
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as-is.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that touch the process environment
    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Run `f` with `key` temporarily set (or removed when `value` is None)
    ///
    /// # Safety
    /// Uses unsafe env::set_var/remove_var; callers hold `env_lock()`.
    fn with_env<F, R>(key: &str, value: Option<&str>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: env_lock() is held by the caller
        match value {
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        let result = f();
        match original {
            // SAFETY: env_lock() is held by the caller
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        let _guard = env_lock();
        with_env(ENV_CONFIG_DIR, Some("/custom/config/path"), || {
            assert_eq!(config_dir().unwrap(), PathBuf::from("/custom/config/path"));
        });
    }

    #[test]
    fn test_state_dir_env_override() {
        let _guard = env_lock();
        with_env(ENV_STATE_DIR, Some("/custom/state/path"), || {
            assert_eq!(state_dir().unwrap(), PathBuf::from("/custom/state/path"));
        });
    }

    #[test]
    fn test_xdg_state_home() {
        let _guard = env_lock();
        with_env(ENV_STATE_DIR, None, || {
            with_env("XDG_STATE_HOME", Some("/tmp/xdg-state-test"), || {
                assert_eq!(
                    state_dir().unwrap(),
                    PathBuf::from("/tmp/xdg-state-test/rolesync")
                );
            });
        });
    }

    #[test]
    fn test_explicit_files_win() {
        assert_eq!(
            config_file(Some(Path::new("/etc/rolesync.toml"))).unwrap(),
            PathBuf::from("/etc/rolesync.toml")
        );
        assert_eq!(
            state_file(Some(Path::new("/var/lib/rolesync.json"))).unwrap(),
            PathBuf::from("/var/lib/rolesync.json")
        );
    }

    #[test]
    fn test_config_file_env() {
        let _guard = env_lock();
        with_env(ENV_CONFIG, Some("/srv/nexus/roles.toml"), || {
            assert_eq!(
                config_file(None).unwrap(),
                PathBuf::from("/srv/nexus/roles.toml")
            );
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand("~/test/path"), home.join("test").join("path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        assert_eq!(
            expand("/path/$NONEXISTENT_VAR_12345/file"),
            PathBuf::from("/path/$NONEXISTENT_VAR_12345/file")
        );
    }
}
