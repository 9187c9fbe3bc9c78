//! Hand-rolled INI-style settings file format.
//!
//! No crate in the reachable dependency set models this store's particular
//! defaulting rules (skip unknown groups/entries silently, fall back to the
//! entry's default on a numeric parse failure, preserve declaration order),
//! so this is a small sans-IO parser in the style of
//! `protocol::rtsp::server_codec`'s own hand-rolled header parsing.

use std::fmt::Write as _;

use super::entry::{SettingsType, SettingsValue};
use super::group::SettingsGroup;

/// One parsed `key=value` line, scoped to the `[group]` header above it.
pub(crate) struct ParsedEntry {
    pub(crate) group_id: String,
    pub(crate) key: String,
    pub(crate) value_text: String,
}

/// Parse an INI document into its flat list of group-scoped entries.
/// Comment lines (`;` or `#`) and blank lines are skipped; a `key=value`
/// line before any `[group]` header is ignored.
pub(crate) fn parse(text: &str) -> Vec<ParsedEntry> {
    let mut out = Vec::new();
    let mut current_group: Option<String> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix('[') {
            if let Some(name) = stripped.strip_suffix(']') {
                current_group = Some(name.to_string());
            }
            continue;
        }
        let Some(group_id) = current_group.clone() else {
            continue;
        };
        if let Some((key, value)) = line.split_once('=') {
            out.push(ParsedEntry {
                group_id,
                key: key.trim().to_string(),
                value_text: value.trim().to_string(),
            });
        }
    }
    out
}

/// Apply parsed entries onto `groups`, skipping unknown groups/entries and
/// falling back to each entry's default on a numeric parse failure.
pub(crate) fn apply(groups: &mut [SettingsGroup], parsed: &[ParsedEntry]) {
    for entry in parsed {
        let Some(group) = groups.iter_mut().find(|g| g.id == entry.group_id) else {
            continue;
        };
        let Some(target) = group.entries.iter_mut().find(|e| e.id == entry.key) else {
            continue;
        };
        let tag = target.type_tag();
        let value = match tag {
            SettingsType::String => SettingsValue::String(entry.value_text.clone()),
            _ => SettingsValue::parse_or_default(tag, &entry.value_text, &target.default_value),
        };
        target.current_value = value.clone();
        target.pending_value = value;
    }
}

/// Serialize `groups` back into INI text, one `[group]` per group, entries
/// in declaration order, a blank line between groups.
pub(crate) fn serialize(groups: &[SettingsGroup]) -> String {
    let mut out = String::new();
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "[{}]", group.id);
        for entry in &group.entries {
            let _ = writeln!(out, "{}={}", entry.id, entry.current_value.to_text());
        }
    }
    out
}
