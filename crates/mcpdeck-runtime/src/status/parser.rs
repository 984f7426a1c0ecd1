//! Parsing of the agent CLI's health listing.
//!
//! The CLI prints a human-oriented listing, one server per line:
//!
//! ```text
//! Checking MCP server health...
//!
//! memory: npx -y @scope/memory - ✓ Connected
//! plugin:tools:search: npx search - ✗ Failed to connect
//! ```
//!
//! The format is not a versioned contract, so parsing is deliberately
//! tolerant: any line that does not match the
//! `<identifier>: <command> - <status>` shape is silently skipped.
//! All scraping of this output is isolated here; a future move to a
//! machine-readable listing only touches this module.

use std::borrow::Cow;
use std::sync::LazyLock;

use mcpdeck_core::domain::{ServerRecord, ServerStatus};
use regex::Regex;

/// Banner line the CLI prints ahead of the listing.
pub const HEALTH_BANNER: &str = "Checking MCP server health...";

/// CSI-style ANSI escape sequences (colors, glyph styling).
static ANSI_ESCAPES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{1b}\\[[0-9;]*[A-Za-z]").expect("static ANSI pattern"));

/// Remove ANSI escape sequences from CLI output.
#[must_use]
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPES.replace_all(text, "")
}

/// Parse the CLI's health listing into server records.
///
/// Pure function: records come back in listing order, with scope and
/// config unset (the merge resolver attaches those).
#[must_use]
pub fn parse_status_output(raw: &str) -> Vec<ServerRecord> {
    let cleaned = strip_ansi(raw);
    cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != HEALTH_BANNER)
        .filter_map(parse_line)
        .collect()
}

/// Parse one `<identifier>: <command> - <status>` line.
///
/// The status separator is the *last* `" - "` so commands containing a
/// dash survive; the identifier separator is the *first* `": "` so
/// compound `plugin:x:y` identifiers survive.
fn parse_line(line: &str) -> Option<ServerRecord> {
    let (head, status_text) = line.rsplit_once(" - ")?;
    let (identifier, command) = head.split_once(": ")?;

    let identifier = identifier.trim();
    if identifier.is_empty() || identifier.contains(char::is_whitespace) {
        return None;
    }

    Some(ServerRecord::from_cli(
        identifier,
        command.trim(),
        classify_status(status_text),
    ))
}

/// Classify the trailing status text by keyword, in fixed priority order.
fn classify_status(text: &str) -> ServerStatus {
    let lowered = text.to_lowercase();
    if lowered.contains("connected") {
        ServerStatus::Connected
    } else if lowered.contains("failed") {
        ServerStatus::Failed
    } else if lowered.contains("needs") && lowered.contains("auth") {
        ServerStatus::NeedsAuth
    } else if lowered.contains("pending") {
        ServerStatus::Pending
    } else {
        ServerStatus::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_and_blank_lines_produce_no_records() {
        let raw = format!("{HEALTH_BANNER}\n\n\n");
        assert!(parse_status_output(&raw).is_empty());
    }

    #[test]
    fn test_connected_line() {
        let records = parse_status_output("memory: npx -y @scope/memory - ✓ Connected");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "memory");
        assert_eq!(records[0].full_name, "memory");
        assert_eq!(records[0].display_command, "npx -y @scope/memory");
        assert_eq!(records[0].status, ServerStatus::Connected);
    }

    #[test]
    fn test_failed_and_auth_and_pending_lines() {
        let raw = "\
a: npx a - ✗ Failed to connect
b: npx b - ⚠ Needs authentication
c: npx c - ◌ Pending";
        let records = parse_status_output(raw);
        assert_eq!(records[0].status, ServerStatus::Failed);
        assert_eq!(records[1].status, ServerStatus::NeedsAuth);
        assert_eq!(records[2].status, ServerStatus::Pending);
    }

    #[test]
    fn test_unrecognized_status_is_unknown() {
        let records = parse_status_output("a: npx a - ✶ Doing something novel");
        assert_eq!(records[0].status, ServerStatus::Unknown);
    }

    #[test]
    fn test_plugin_identifier_keeps_compound_full_name() {
        let records = parse_status_output("plugin:github-tools:search: npx search - ✓ Connected");
        assert_eq!(records[0].full_name, "plugin:github-tools:search");
        assert_eq!(records[0].name, "search");
    }

    #[test]
    fn test_command_containing_dash_separator() {
        let records = parse_status_output("a: run - fast - ✓ Connected");
        assert_eq!(records[0].display_command, "run - fast");
        assert_eq!(records[0].status, ServerStatus::Connected);
    }

    #[test]
    fn test_ansi_escapes_are_stripped() {
        let raw = "memory: npx memory - \u{1b}[32m✓ Connected\u{1b}[0m";
        let records = parse_status_output(raw);
        assert_eq!(records[0].status, ServerStatus::Connected);
    }

    #[test]
    fn test_non_matching_lines_are_skipped() {
        let raw = "\
Some explanatory prose from the CLI
memory: npx memory - ✓ Connected
another line without the shape";
        let records = parse_status_output(raw);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_classification_priority_is_fixed() {
        // "connected" wins over any other keyword in the same line
        assert_eq!(classify_status("reconnected after auth"), ServerStatus::Connected);
        // "failed" is checked before needs/auth
        assert_eq!(classify_status("failed: needs auth"), ServerStatus::Failed);
    }

    #[test]
    fn test_records_preserve_listing_order() {
        let raw = "\
b: npx b - ✓ Connected
a: npx a - ✓ Connected";
        let records = parse_status_output(raw);
        assert_eq!(records[0].full_name, "b");
        assert_eq!(records[1].full_name, "a");
    }
}
