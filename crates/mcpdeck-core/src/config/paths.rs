//! Locations of the four configuration stores.
//!
//! All user-level stores live under a single config root, overridable
//! via `MCPDECK_CONFIG_DIR` (used heavily by tests). Project and plugin
//! stores live inside the workspace / plugin install directory.

use std::path::{Path, PathBuf};

use super::error::ConfigError;

/// Environment variable overriding the config root directory.
pub const CONFIG_DIR_ENV: &str = "MCPDECK_CONFIG_DIR";

/// File name of the project and plugin stores.
pub const PROJECT_STORE_FILE: &str = ".mcp.json";

/// Root directory for the user-level stores.
///
/// `$MCPDECK_CONFIG_DIR` when set, otherwise `~/.mcpdeck`.
pub fn config_root() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".mcpdeck"))
        .ok_or(ConfigError::NoHomeDir)
}

/// Global user store: flat `name -> {command, args?, env?}` map.
pub fn user_store_path() -> Result<PathBuf, ConfigError> {
    Ok(config_root()?.join("servers.json"))
}

/// Workspace-local store: one global file, entries nested under
/// `projects.<workspace-path>`.
pub fn workspace_store_path() -> Result<PathBuf, ConfigError> {
    Ok(config_root()?.join("workspaces.json"))
}

/// Project store: one flat-map file per workspace root.
pub fn project_store_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(PROJECT_STORE_FILE)
}

/// Plugin-bundled store: one flat-map file per plugin install directory.
pub fn plugin_store_path(install_dir: &Path) -> PathBuf {
    install_dir.join(PROJECT_STORE_FILE)
}
