use serde_json::{Map, Value};
use std::path::Path;

use crate::config::{read_text_file, write_text_file};
use crate::error::AppError;
use crate::mcp::SyncFormat;
use crate::store::AppState;
use crate::strategy::{apply_server_strategy, SyncStrategy};

use super::SyncService;

impl SyncService {
    /// Server entries of a set keyed by definition name, in item order.
    /// Disabled items and items whose definition is gone are left out.
    pub fn resolve_mcp_source(
        state: &AppState,
        source_id: &str,
    ) -> Result<Map<String, Value>, AppError> {
        let set = state
            .db
            .get_mcp_set(source_id)?
            .ok_or_else(|| AppError::not_found(format!("MCP set '{source_id}'")))?;
        let pool = state.db.get_all_mcp_definitions()?;

        let mut servers = Map::new();
        for item in set.items.iter().filter(|item| !item.disabled) {
            match pool.get(&item.server_id) {
                Some(def) => {
                    servers.insert(def.name.clone(), def.to_server_spec());
                }
                None => log::warn!(
                    "Set '{}' references missing MCP definition {}, skipping",
                    set.name,
                    item.server_id
                ),
            }
        }
        Ok(servers)
    }

    /// Write the servers of set `source_id` into the config file at `path`.
    ///
    /// `selected = None` writes every server of the set; otherwise only the
    /// requested names that exist in the set. Returns the names written, empty
    /// when nothing was to be written (the file is then left untouched).
    pub fn sync_one_mcp(
        state: &AppState,
        tool_id: &str,
        path: &Path,
        selected: Option<&[String]>,
        strategy: SyncStrategy,
        source_id: &str,
    ) -> Result<Vec<String>, AppError> {
        if source_id.trim().is_empty() {
            return Err(AppError::validation("sourceId is required for MCP sync"));
        }
        if path.as_os_str().is_empty() {
            return Err(AppError::validation("target path is required for MCP sync"));
        }

        let source = Self::resolve_mcp_source(state, source_id)?;
        if source.is_empty() {
            log::warn!("MCP set {source_id} has no enabled servers, nothing synced to {tool_id}");
            return Ok(Vec::new());
        }

        let format = SyncFormat::from_path(path);
        let current = read_text_file(path)?;
        let mut document = match current.as_deref() {
            Some(text) => format.parse(text)?,
            None => format.empty_document(),
        };

        let selection: Map<String, Value> = match selected {
            None => source,
            Some(names) => source
                .into_iter()
                .filter(|(name, _)| names.iter().any(|n| n == name))
                .collect(),
        };
        if selection.is_empty() {
            log::info!("No selected MCP servers for {tool_id}, skipping write");
            return Ok(Vec::new());
        }

        let merged = apply_server_strategy(&document.servers(), &selection, strategy);
        document.set_servers(&merged)?;
        let output = document.to_text()?;

        Self::warn_on_drift(state, path, current.as_deref());
        Self::snapshot_before_write(state, &format!("mcp-{tool_id}"), path);
        write_text_file(path, &output)?;
        Self::record_written(state, path, &output)?;

        let applied: Vec<String> = selection.keys().cloned().collect();
        log::info!(
            "Synced {} MCP server(s) to {} ({}, {strategy})",
            applied.len(),
            path.display(),
            tool_id
        );
        Ok(applied)
    }
}
