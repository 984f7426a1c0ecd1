//! Multi-store scope resolution.
//!
//! Combines the four configuration stores into a single
//! `name -> (scope, config)` mapping with fixed precedence, and caches
//! the result until explicitly invalidated. The resolver never re-reads
//! stores on its own: invalidation comes from the host (config file
//! change, workspace change), not from time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::error::ConfigError;
use super::source::{NO_WORKSPACE_KEY, RawServerMap, SourceReader};
use crate::domain::{ServerConfig, ServerScope, plugin_full_name};
use crate::ports::PluginCatalog;

/// Scope and (optional) structured config for one server identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeMeta {
    pub scope: ServerScope,
    pub config: Option<ServerConfig>,
}

/// Mapping from server identifier to its resolved metadata.
pub type ScopeMetadataMap = HashMap<String, ScopeMeta>;

/// Identity of the currently open workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceContext {
    root: Option<PathBuf>,
}

impl WorkspaceContext {
    #[must_use]
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Root directory of the open workspace, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Key under which the workspace-local store files this workspace.
    ///
    /// `/` when no workspace is open.
    #[must_use]
    pub fn store_key(&self) -> String {
        self.root.as_ref().map_or_else(
            || NO_WORKSPACE_KEY.to_string(),
            |root| root.to_string_lossy().into_owned(),
        )
    }
}

/// Resolves each server name to its owning scope and config.
///
/// Precedence is evaluated in fixed order, first writer wins: a name
/// claimed by an earlier store is never overwritten by a later one.
///
/// 1. global user store -> scope `user`
/// 2. workspace-local store -> scope `local`
/// 3. project store -> scope `project`
/// 4. plugin-bundled stores -> the plugin's own install scope, under
///    the compound `plugin:<pluginId>:<serverName>` identifier
pub struct ScopeResolver {
    reader: Arc<dyn SourceReader>,
    plugins: Arc<dyn PluginCatalog>,
    workspace: RwLock<WorkspaceContext>,
    cache: RwLock<Option<Arc<ScopeMetadataMap>>>,
}

impl ScopeResolver {
    pub fn new(
        reader: Arc<dyn SourceReader>,
        plugins: Arc<dyn PluginCatalog>,
        workspace: WorkspaceContext,
    ) -> Self {
        Self {
            reader,
            plugins,
            workspace: RwLock::new(workspace),
            cache: RwLock::new(None),
        }
    }

    /// Resolve the merged map, serving from cache when one exists.
    ///
    /// A malformed or unreadable store contributes nothing and is
    /// logged; resolution itself never fails.
    pub async fn resolve(&self) -> Arc<ScopeMetadataMap> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return Arc::clone(cached);
        }

        let map = Arc::new(self.build().await);

        let mut cache = self.cache.write().await;
        *cache = Some(Arc::clone(&map));
        map
    }

    /// Drop the cached map; the next [`resolve`](Self::resolve) re-reads
    /// every store.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
        debug!("Scope metadata cache invalidated");
    }

    /// Switch to a different workspace and invalidate.
    pub async fn set_workspace(&self, context: WorkspaceContext) {
        {
            let mut workspace = self.workspace.write().await;
            *workspace = context;
        }
        self.invalidate().await;
    }

    async fn build(&self) -> ScopeMetadataMap {
        let workspace = self.workspace.read().await.clone();
        let store_key = workspace.store_key();

        // The three fixed stores are independent files; read them
        // concurrently. The merge below is strictly sequential over the
        // fetched results.
        let (user, local, project) = tokio::join!(
            self.reader.read_user_store(),
            self.reader.read_workspace_store(&store_key),
            async {
                match workspace.root() {
                    Some(root) => self.reader.read_project_store(root).await,
                    None => Ok(RawServerMap::new()),
                }
            },
        );

        let mut map = ScopeMetadataMap::new();
        merge_store(&mut map, user, ServerScope::User, "user");
        merge_store(&mut map, local, ServerScope::Local, "local");
        merge_store(&mut map, project, ServerScope::Project, "project");

        self.merge_plugin_stores(&mut map).await;

        debug!(servers = map.len(), "Scope metadata rebuilt");
        map
    }

    /// Fan out one read task per installed plugin, then merge.
    ///
    /// Compound identifiers are unique per plugin, so join order does
    /// not affect the result.
    async fn merge_plugin_stores(&self, map: &mut ScopeMetadataMap) {
        let plugins = self.plugins.installed().await;
        if plugins.is_empty() {
            return;
        }

        let mut reads = tokio::task::JoinSet::new();
        for plugin in plugins {
            let reader = Arc::clone(&self.reader);
            reads.spawn(async move {
                let entries = reader.read_plugin_store(&plugin.install_dir).await;
                (plugin, entries)
            });
        }

        while let Some(joined) = reads.join_next().await {
            let Ok((plugin, entries)) = joined else {
                warn!("Plugin store read task failed to join");
                continue;
            };
            let entries = match entries {
                Ok(entries) => entries,
                Err(error) => {
                    warn!(plugin = %plugin.id, error = %error, "Skipping unreadable plugin store");
                    continue;
                }
            };
            for (name, value) in entries {
                // Only entries shaped like a real invocation count
                let Some(config) = parse_config(&value) else {
                    warn!(plugin = %plugin.id, server = %name, "Skipping plugin server without a command");
                    continue;
                };
                map.entry(plugin_full_name(&plugin.id, &name))
                    .or_insert(ScopeMeta {
                        scope: plugin.scope,
                        config: Some(config),
                    });
            }
        }
    }
}

/// Merge one fixed store into the map, first writer wins.
fn merge_store(
    map: &mut ScopeMetadataMap,
    entries: Result<RawServerMap, ConfigError>,
    scope: ServerScope,
    label: &str,
) {
    let entries = match entries {
        Ok(entries) => entries,
        Err(error) => {
            // Contributes nothing, but never aborts the resolution
            warn!(store = label, error = %error, "Skipping unreadable config store");
            return;
        }
    };
    for (name, value) in entries {
        map.entry(name).or_insert(ScopeMeta {
            scope,
            config: parse_config(&value),
        });
    }
}

/// Parse a raw store entry into a structured invocation.
///
/// Entries without a usable `command` field yield `None`; the server
/// name is still claimable by the owning store, just without config.
fn parse_config(value: &Value) -> Option<ServerConfig> {
    let config: ServerConfig = serde_json::from_value(value.clone()).ok()?;
    if config.command.trim().is_empty() {
        return None;
    }
    Some(config)
}
