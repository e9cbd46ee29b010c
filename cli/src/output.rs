//! Table formatting helpers for CLI output.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table};
use tagkeep_core::truncate_chars;

/// Create a borderless table with the given headers.
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Push date the way the cleanup log prints it.
pub fn format_pushed(dt: &DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y %H:%M").to_string()
}

/// Tags joined by commas, or `<untagged>`.
pub fn format_tags(tags: &BTreeSet<String>) -> String {
    if tags.is_empty() {
        "<untagged>".to_string()
    } else {
        tags.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

/// Digest shortened to "sha256:" plus 12 hex characters.
pub fn short_digest(digest: &str) -> String {
    match digest.split_once(':') {
        Some((algo, hex)) => format!("{algo}:{}", truncate_chars(hex, 12)),
        None => truncate_chars(digest, 12).to_string(),
    }
}
