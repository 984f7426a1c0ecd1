//! Plugin inventory port.
//!
//! Install-entry bookkeeping (marketplaces, enable/disable state) is an
//! external collaborator; the merge resolver only needs to know which
//! plugins are installed, where, and at what scope.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::ServerScope;

/// One installed plugin, as reported by the host's bookkeeping layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPlugin {
    /// Plugin identifier, used in compound server names.
    pub id: String,
    /// Directory the plugin was installed into.
    pub install_dir: PathBuf,
    /// Scope the plugin itself was installed at; its bundled servers
    /// inherit this scope.
    pub scope: ServerScope,
}

impl InstalledPlugin {
    pub fn new(id: impl Into<String>, install_dir: impl Into<PathBuf>, scope: ServerScope) -> Self {
        Self {
            id: id.into(),
            install_dir: install_dir.into(),
            scope,
        }
    }
}

/// Port for listing installed plugins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PluginCatalog: Send + Sync {
    /// Currently installed plugins, in install order.
    async fn installed(&self) -> Vec<InstalledPlugin>;
}

/// Fixed in-memory [`PluginCatalog`] for hosts without plugin support
/// and for wiring tests.
#[derive(Debug, Clone, Default)]
pub struct StaticPluginCatalog {
    plugins: Vec<InstalledPlugin>,
}

impl StaticPluginCatalog {
    #[must_use]
    pub fn new(plugins: Vec<InstalledPlugin>) -> Self {
        Self { plugins }
    }

    /// Catalog that reports no plugins.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginCatalog for StaticPluginCatalog {
    async fn installed(&self) -> Vec<InstalledPlugin> {
        self.plugins.clone()
    }
}
