//! Raw reads of the four configuration stores.
//!
//! Each store is read independently and fault-tolerantly: a missing
//! file yields an empty map, while malformed JSON is surfaced as
//! [`ConfigError::Parse`] so the caller can decide what to do with it.
//! Nothing here caches; memoization is the resolver's job.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::error::ConfigError;
use super::paths::{plugin_store_path, project_store_path, user_store_path, workspace_store_path};

/// Flat `name -> raw config` map as stored on disk.
pub type RawServerMap = serde_json::Map<String, Value>;

/// Store key used in the workspace-local file when no workspace is open.
pub const NO_WORKSPACE_KEY: &str = "/";

/// Port for reading the configuration stores.
///
/// The filesystem implementation is [`FsSourceReader`]; tests inject
/// in-memory doubles to script store contents and count reads.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Global user store: flat map at the file's top level.
    async fn read_user_store(&self) -> Result<RawServerMap, ConfigError>;

    /// Workspace-local store: entries nested under
    /// `projects.<workspace_key>` inside one global file.
    async fn read_workspace_store(&self, workspace_key: &str) -> Result<RawServerMap, ConfigError>;

    /// Project store: flat-map file at the workspace root.
    async fn read_project_store(&self, workspace_root: &Path) -> Result<RawServerMap, ConfigError>;

    /// Plugin-bundled store: flat-map file in the plugin's install dir.
    async fn read_plugin_store(&self, install_dir: &Path) -> Result<RawServerMap, ConfigError>;
}

/// Filesystem-backed [`SourceReader`].
#[derive(Debug, Clone)]
pub struct FsSourceReader {
    user_store: PathBuf,
    workspace_store: PathBuf,
}

impl FsSourceReader {
    /// Reader rooted at the default config directory.
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            user_store: user_store_path()?,
            workspace_store: workspace_store_path()?,
        })
    }

    /// Reader rooted at an explicit directory (test fixtures).
    #[must_use]
    pub fn with_root(root: &Path) -> Self {
        Self {
            user_store: root.join("servers.json"),
            workspace_store: root.join("workspaces.json"),
        }
    }
}

#[async_trait]
impl SourceReader for FsSourceReader {
    async fn read_user_store(&self) -> Result<RawServerMap, ConfigError> {
        read_flat_map(&self.user_store).await
    }

    async fn read_workspace_store(&self, workspace_key: &str) -> Result<RawServerMap, ConfigError> {
        let Some(value) = read_json_value(&self.workspace_store).await? else {
            return Ok(RawServerMap::new());
        };
        let entries = value
            .get("projects")
            .and_then(|projects| projects.get(workspace_key))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Ok(entries)
    }

    async fn read_project_store(&self, workspace_root: &Path) -> Result<RawServerMap, ConfigError> {
        read_flat_map(&project_store_path(workspace_root)).await
    }

    async fn read_plugin_store(&self, install_dir: &Path) -> Result<RawServerMap, ConfigError> {
        read_flat_map(&plugin_store_path(install_dir)).await
    }
}

/// Read a JSON file, mapping "not found" to `None`.
async fn read_json_value(path: &Path) -> Result<Option<Value>, ConfigError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let value = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(value))
}

/// Read a store whose top level is the flat server map itself.
async fn read_flat_map(path: &Path) -> Result<RawServerMap, ConfigError> {
    match read_json_value(path).await? {
        Some(Value::Object(map)) => Ok(map),
        Some(_) => {
            // Valid JSON of the wrong shape contributes nothing
            warn!(path = %path.display(), "Config store is not a JSON object, ignoring");
            Ok(RawServerMap::new())
        }
        None => Ok(RawServerMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    async fn write(path: &Path, value: &Value) {
        tokio::fs::write(path, serde_json::to_vec_pretty(value).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_store_reads_empty() {
        let dir = tempdir().unwrap();
        let reader = FsSourceReader::with_root(dir.path());
        let map = reader.read_user_store().await.unwrap();
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_user_store_flat_map() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join("servers.json"),
            &json!({"memory": {"command": "npx", "args": ["-y", "memory"]}}),
        )
        .await;

        let reader = FsSourceReader::with_root(dir.path());
        let map = reader.read_user_store().await.unwrap();
        assert!(map.contains_key("memory"));
    }

    #[tokio::test]
    async fn test_workspace_store_nested_under_projects_key() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join("workspaces.json"),
            &json!({"projects": {
                "/work/repo": {"search": {"command": "npx"}},
                "/": {"fallback": {"command": "npx"}}
            }}),
        )
        .await;

        let reader = FsSourceReader::with_root(dir.path());
        let map = reader.read_workspace_store("/work/repo").await.unwrap();
        assert!(map.contains_key("search"));

        let fallback = reader.read_workspace_store(NO_WORKSPACE_KEY).await.unwrap();
        assert!(fallback.contains_key("fallback"));

        let other = reader.read_workspace_store("/elsewhere").await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_store_is_a_parse_error() {
        let dir = tempdir().unwrap();
        tokio::fs::write(dir.path().join("servers.json"), "{not json")
            .await
            .unwrap();

        let reader = FsSourceReader::with_root(dir.path());
        let err = reader.read_user_store().await.unwrap_err();
        assert!(err.is_parse());
    }

    #[tokio::test]
    async fn test_non_object_store_contributes_nothing() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("servers.json"), &json!([1, 2, 3])).await;

        let reader = FsSourceReader::with_root(dir.path());
        let map = reader.read_user_store().await.unwrap();
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_project_store_read_from_workspace_root() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join(".mcp.json"),
            &json!({"repo-tools": {"command": "cargo", "args": ["run"]}}),
        )
        .await;

        let reader = FsSourceReader::with_root(dir.path());
        let map = reader.read_project_store(dir.path()).await.unwrap();
        assert!(map.contains_key("repo-tools"));
    }
}
