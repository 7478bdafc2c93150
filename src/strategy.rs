//! Content reconciliation between what a target file holds and what a sync
//! wants to write. Pure text / map transforms, no I/O.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Opening line of the managed region. Written into user files; never change it.
pub const MARKER_START: &str = "<!-- CLI-SYNC:START -->";
/// Closing line of the managed region. Written into user files; never change it.
pub const MARKER_END: &str = "<!-- CLI-SYNC:END -->";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStrategy {
    Overwrite,
    Append,
    SmartUpdate,
    DeepMerge,
}

impl SyncStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStrategy::Overwrite => "overwrite",
            SyncStrategy::Append => "append",
            SyncStrategy::SmartUpdate => "smart-update",
            SyncStrategy::DeepMerge => "deep-merge",
        }
    }
}

impl Default for SyncStrategy {
    fn default() -> Self {
        SyncStrategy::Append
    }
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(SyncStrategy::Overwrite),
            "append" => Ok(SyncStrategy::Append),
            "smart-update" | "smart_update" => Ok(SyncStrategy::SmartUpdate),
            "deep-merge" | "deep_merge" => Ok(SyncStrategy::DeepMerge),
            other => Err(AppError::validation(format!(
                "unknown strategy '{other}'. Allowed: overwrite, append, smart-update, deep-merge"
            ))),
        }
    }
}

/// Reconcile whole-file text.
///
/// `deep-merge` has no meaning for free text and is rejected like any
/// unknown strategy.
pub fn apply_text_strategy(
    current: &str,
    incoming: &str,
    strategy: SyncStrategy,
) -> Result<String, AppError> {
    match strategy {
        SyncStrategy::Overwrite => Ok(incoming.to_string()),
        SyncStrategy::Append => Ok(append_text(current, incoming)),
        SyncStrategy::SmartUpdate => smart_update(current, incoming),
        SyncStrategy::DeepMerge => Err(AppError::validation(
            "unknown strategy 'deep-merge' for text content",
        )),
    }
}

/// Same as [`apply_text_strategy`] with the strategy given by name
pub fn apply_text_strategy_named(
    current: &str,
    incoming: &str,
    strategy: &str,
) -> Result<String, AppError> {
    apply_text_strategy(current, incoming, strategy.parse()?)
}

fn separator_for(current: &str) -> &'static str {
    if current.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    }
}

pub fn append_text(current: &str, incoming: &str) -> String {
    if current.is_empty() {
        return incoming.to_string();
    }
    format!("{current}{}{incoming}", separator_for(current))
}

fn managed_block(incoming: &str) -> Result<String, AppError> {
    if incoming.contains(MARKER_START) || incoming.contains(MARKER_END) {
        return Err(AppError::validation(
            "content must not contain CLI-SYNC marker lines",
        ));
    }
    Ok(format!("{MARKER_START}\n{incoming}\n{MARKER_END}"))
}

/// Byte range `start..end` covering both marker lines.
///
/// Markers only count as whole lines. The region closes at the first END
/// line that has a START above it, and opens at the nearest such START, so a
/// stray unpaired START never swallows the text after it.
fn find_managed_region(current: &str) -> Option<(usize, usize)> {
    let mut open = None;
    let mut offset = 0;
    for raw in current.split_inclusive('\n') {
        let line = raw.trim_end_matches('\n').trim_end_matches('\r');
        if line == MARKER_START {
            open = Some(offset);
        } else if line == MARKER_END {
            if let Some(start) = open {
                return Some((start, offset + line.len()));
            }
        }
        offset += raw.len();
    }
    None
}

pub fn smart_update(current: &str, incoming: &str) -> Result<String, AppError> {
    let block = managed_block(incoming)?;
    Ok(match find_managed_region(current) {
        Some((start, end)) => format!("{}{block}{}", &current[..start], &current[end..]),
        None => append_text(current, &block),
    })
}

/// Merge server maps field by field.
///
/// Shared keys keep every field of `existing[key]` and take every field of
/// `incoming[key]`; keys from either side alone pass through unchanged.
/// Entries that are not objects on both sides are replaced by `incoming`.
pub fn deep_merge_server_map(
    existing: &Map<String, Value>,
    incoming: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = existing.clone();
    for (key, incoming_entry) in incoming {
        let combined = match (merged.get(key), incoming_entry) {
            (Some(Value::Object(current)), Value::Object(fields)) => {
                let mut out = current.clone();
                for (field, value) in fields {
                    out.insert(field.clone(), value.clone());
                }
                Value::Object(out)
            }
            _ => incoming_entry.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    merged
}

/// Shallow merge: colliding entries are replaced wholesale
pub fn shallow_merge_server_map(
    existing: &Map<String, Value>,
    incoming: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = existing.clone();
    for (key, value) in incoming {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Server-map reconciliation used by MCP syncs; `smart-update` behaves like `append`
pub fn apply_server_strategy(
    existing: &Map<String, Value>,
    incoming: &Map<String, Value>,
    strategy: SyncStrategy,
) -> Map<String, Value> {
    match strategy {
        SyncStrategy::Overwrite => incoming.clone(),
        SyncStrategy::DeepMerge => deep_merge_server_map(existing, incoming),
        SyncStrategy::Append | SyncStrategy::SmartUpdate => {
            shallow_merge_server_map(existing, incoming)
        }
    }
}
