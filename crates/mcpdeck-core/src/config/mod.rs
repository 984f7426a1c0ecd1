//! Configuration stores and scope resolution.
//!
//! Four independent JSON stores define MCP servers: the global user
//! store, the workspace-local store, the per-project store, and one
//! bundled store per installed plugin. [`ScopeResolver`] merges them
//! into a single identifier -> (scope, config) mapping with fixed
//! precedence and an explicitly-invalidated cache.

mod error;
mod paths;
mod resolver;
mod source;

pub use error::ConfigError;
pub use paths::{
    CONFIG_DIR_ENV, PROJECT_STORE_FILE, config_root, plugin_store_path, project_store_path,
    user_store_path, workspace_store_path,
};
pub use resolver::{ScopeMeta, ScopeMetadataMap, ScopeResolver, WorkspaceContext};
pub use source::{FsSourceReader, NO_WORKSPACE_KEY, RawServerMap, SourceReader};
