use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use toml_edit::{DocumentMut, Item, Table};

use crate::error::AppError;

use super::toml_convert::{json_server_to_toml_table, toml_item_to_json};

/// On-disk format of a tool's MCP config; owns the container key and (de)serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncFormat {
    Json,
    Toml,
}

impl SyncFormat {
    /// `.toml` selects TOML; every other extension (or none) is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => SyncFormat::Toml,
            _ => SyncFormat::Json,
        }
    }

    /// Key under which server entries live
    pub fn container_key(&self) -> &'static str {
        match self {
            SyncFormat::Json => "mcpServers",
            SyncFormat::Toml => "mcp_servers",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncFormat::Json => "json",
            SyncFormat::Toml => "toml",
        }
    }

    pub fn empty_document(&self) -> ConfigDocument {
        match self {
            SyncFormat::Json => ConfigDocument::Json(Value::Object(Map::new())),
            SyncFormat::Toml => ConfigDocument::Toml(DocumentMut::new()),
        }
    }

    /// Parse existing file content; blank content yields an empty document
    pub fn parse(&self, text: &str) -> Result<ConfigDocument, AppError> {
        if text.trim().is_empty() {
            return Ok(self.empty_document());
        }

        match self {
            SyncFormat::Json => {
                let value: Value = serde_json::from_str(text)
                    .map_err(|e| AppError::format(*self, e.to_string()))?;
                if !value.is_object() {
                    return Err(AppError::format(
                        *self,
                        "top-level value must be an object",
                    ));
                }
                Ok(ConfigDocument::Json(value))
            }
            SyncFormat::Toml => text
                .parse::<DocumentMut>()
                .map(ConfigDocument::Toml)
                .map_err(|e| AppError::format(*self, e.to_string())),
        }
    }
}

impl fmt::Display for SyncFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncFormat::Json => write!(f, "JSON"),
            SyncFormat::Toml => write!(f, "TOML"),
        }
    }
}

/// Parsed target config. Only the container sub-map is ever rewritten;
/// every other top-level field passes through untouched.
#[derive(Debug, Clone)]
pub enum ConfigDocument {
    Json(Value),
    Toml(DocumentMut),
}

impl ConfigDocument {
    pub fn format(&self) -> SyncFormat {
        match self {
            ConfigDocument::Json(_) => SyncFormat::Json,
            ConfigDocument::Toml(_) => SyncFormat::Toml,
        }
    }

    /// Current server entries as JSON, keyed by server name
    pub fn servers(&self) -> Map<String, Value> {
        let key = self.format().container_key();
        match self {
            ConfigDocument::Json(root) => root
                .get(key)
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default(),
            ConfigDocument::Toml(doc) => doc
                .get(key)
                .and_then(toml_item_to_json)
                .and_then(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .unwrap_or_default(),
        }
    }

    /// Replace the container with `servers`
    pub fn set_servers(&mut self, servers: &Map<String, Value>) -> Result<(), AppError> {
        let format = self.format();
        let key = format.container_key();
        match self {
            ConfigDocument::Json(root) => {
                let obj = root
                    .as_object_mut()
                    .ok_or_else(|| AppError::format(format, "top-level value must be an object"))?;
                obj.insert(key.to_string(), Value::Object(servers.clone()));
                Ok(())
            }
            ConfigDocument::Toml(doc) => {
                let root = doc.as_table_mut();
                if !matches!(root.get(key), Some(Item::Table(_))) {
                    // absent, or written as an inline table / dotted value
                    let mut fresh = Table::new();
                    fresh.set_implicit(true);
                    root.insert(key, Item::Table(fresh));
                }
                let table = root
                    .get_mut(key)
                    .and_then(Item::as_table_mut)
                    .ok_or_else(|| AppError::format(format, format!("'{key}' must be a table")))?;

                let stale: Vec<String> = table
                    .iter()
                    .map(|(name, _)| name.to_string())
                    .filter(|name| !servers.contains_key(name))
                    .collect();
                for name in stale {
                    table.remove(&name);
                }

                for (name, spec) in servers {
                    // unchanged entries keep their original layout and comments
                    let unchanged = table
                        .get(name)
                        .and_then(toml_item_to_json)
                        .is_some_and(|current| &current == spec);
                    if !unchanged {
                        table.insert(name, Item::Table(json_server_to_toml_table(spec)?));
                    }
                }
                Ok(())
            }
        }
    }

    pub fn to_text(&self) -> Result<String, AppError> {
        match self {
            ConfigDocument::Json(root) => {
                let mut text = serde_json::to_string_pretty(root)
                    .map_err(|e| AppError::JsonSerialize { source: e })?;
                text.push('\n');
                Ok(text)
            }
            ConfigDocument::Toml(doc) => Ok(doc.to_string()),
        }
    }
}
