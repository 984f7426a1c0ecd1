//! Server records and their identity scheme.
//!
//! A [`ServerRecord`] describes one externally-connected MCP server as seen
//! by one reconciliation cycle. `full_name` is the stable join key across
//! cycles; `name` is derived from it and may collide across scopes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix used for plugin-provided server identifiers.
pub const PLUGIN_ID_PREFIX: &str = "plugin";

/// Live connection status of an MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerStatus {
    /// Server responded to the health check.
    Connected,
    /// Server failed its health check.
    Failed,
    /// Server is reachable but requires (re-)authentication.
    NeedsAuth,
    /// Connection attempt still in progress.
    Pending,
    /// Status line could not be classified.
    Unknown,
}

impl ServerStatus {
    /// Stable lowercase label, used in fingerprints and display output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Failed => "failed",
            Self::NeedsAuth => "needs-auth",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }

    /// Check if the status represents a healthy connection.
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration tier a server definition belongs to.
///
/// Determines which file owns the definition and its precedence in the
/// merge (user > local > project; plugin servers carry the scope of the
/// plugin's own installation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerScope {
    /// Global user store, shared across all workspaces.
    User,
    /// Workspace-local store, private to one workspace.
    Local,
    /// Project store, committed alongside the project.
    Project,
}

impl fmt::Display for ServerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::User => "user",
            Self::Local => "local",
            Self::Project => "project",
        };
        f.write_str(label)
    }
}

/// Structured invocation for a server, as stored in the config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Executable to launch.
    pub command: String,
    /// Arguments passed to the executable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Extra environment variables for the server process.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl ServerConfig {
    /// Human-readable invocation string (`command` plus args, joined).
    #[must_use]
    pub fn display_command(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// One externally-connected server as observed by a reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    /// Short identifier, unique within its scope.
    pub name: String,
    /// Fully-qualified identifier; `plugin:<pluginId>:<serverName>` for
    /// plugin-provided servers. Stable join key across cycles.
    pub full_name: String,
    /// Human-readable invocation, from structured config when known,
    /// otherwise from the raw CLI listing.
    pub display_command: String,
    /// Live connection status.
    pub status: ServerStatus,
    /// Owning configuration tier, absent until resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ServerScope>,
    /// Structured invocation, when the config store carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ServerConfig>,
}

impl ServerRecord {
    /// Build a record from a parsed CLI status line.
    ///
    /// Scope and config stay unset until the merge resolver attaches them.
    #[must_use]
    pub fn from_cli(full_name: impl Into<String>, display_command: impl Into<String>, status: ServerStatus) -> Self {
        let full_name = full_name.into();
        Self {
            name: short_name(&full_name).to_string(),
            full_name,
            display_command: display_command.into(),
            status,
            scope: None,
            config: None,
        }
    }

    /// Build a record straight from a config store, with no live status.
    #[must_use]
    pub fn from_config(full_name: impl Into<String>, scope: ServerScope, config: Option<ServerConfig>) -> Self {
        let full_name = full_name.into();
        Self {
            name: short_name(&full_name).to_string(),
            full_name,
            display_command: config.as_ref().map(ServerConfig::display_command).unwrap_or_default(),
            status: ServerStatus::Unknown,
            scope: Some(scope),
            config,
        }
    }
}

/// Compound identifier for a plugin-provided server.
///
/// The `plugin:` prefix keeps plugin-provided names from ever colliding
/// with user-defined ones sharing the same short name.
#[must_use]
pub fn plugin_full_name(plugin_id: &str, server_name: &str) -> String {
    format!("{PLUGIN_ID_PREFIX}:{plugin_id}:{server_name}")
}

/// Short name of an identifier: the last colon-delimited segment.
///
/// Handles the `plugin:x:y` compound form transparently; a plain name
/// is returned unchanged.
#[must_use]
pub fn short_name(full_name: &str) -> &str {
    full_name.rsplit(':').next().unwrap_or(full_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(ServerStatus::Connected.as_str(), "connected");
        assert_eq!(ServerStatus::NeedsAuth.as_str(), "needs-auth");
        assert!(ServerStatus::Connected.is_healthy());
        assert!(!ServerStatus::Pending.is_healthy());
    }

    #[test]
    fn test_status_serialization_is_kebab_case() {
        let json = serde_json::to_string(&ServerStatus::NeedsAuth).unwrap();
        assert_eq!(json, "\"needs-auth\"");
    }

    #[test]
    fn test_plugin_full_name_round_trip() {
        let full = plugin_full_name("github-tools", "issues");
        assert_eq!(full, "plugin:github-tools:issues");
        assert_eq!(short_name(&full), "issues");
    }

    #[test]
    fn test_short_name_of_plain_identifier() {
        assert_eq!(short_name("memory"), "memory");
    }

    #[test]
    fn test_display_command_joins_args() {
        let config = ServerConfig {
            command: "npx".to_string(),
            args: vec!["-y".to_string(), "@scope/server".to_string()],
            env: BTreeMap::new(),
        };
        assert_eq!(config.display_command(), "npx -y @scope/server");
    }

    #[test]
    fn test_record_from_cli_derives_short_name() {
        let record = ServerRecord::from_cli("plugin:tools:search", "npx search", ServerStatus::Connected);
        assert_eq!(record.name, "search");
        assert_eq!(record.full_name, "plugin:tools:search");
        assert!(record.scope.is_none());
    }

    #[test]
    fn test_record_serialization_uses_camel_case() {
        let record = ServerRecord::from_cli("memory", "npx memory", ServerStatus::Failed);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"fullName\":\"memory\""));
        assert!(json.contains("\"displayCommand\":\"npx memory\""));
        assert!(json.contains("\"status\":\"failed\""));
        // Unset scope/config are omitted from the wire
        assert!(!json.contains("scope"));
    }
}
