use crate::error::AppError;
use crate::services::sync::SyncConfig;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{lock_conn, now_millis, to_json_string, Database};

fn config_from_row(row: &Row<'_>) -> rusqlite::Result<SyncConfig> {
    let servers_str: Option<String> = row.get(2)?;
    Ok(SyncConfig {
        tool_id: row.get(0)?,
        enabled: row.get(1)?,
        servers: servers_str.and_then(|s| serde_json::from_str(&s).ok()),
        target_path: row.get(3)?,
        global: row.get(4)?,
        rules_source_id: row.get(5)?,
    })
}

impl Database {
    /// Stored config for a tool, or the defaults when it was never saved
    pub fn get_tool_sync_config(&self, tool_id: &str) -> Result<SyncConfig, AppError> {
        let conn = lock_conn!(self.conn);
        let stored = conn
            .query_row(
                "SELECT tool_id, enabled, servers, target_path, is_global, rules_source_id
                 FROM tool_sync_configs WHERE tool_id = ?1",
                params![tool_id],
                config_from_row,
            )
            .optional()
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(stored.unwrap_or_else(|| SyncConfig::defaults_for(tool_id)))
    }

    pub fn list_tool_sync_configs(&self) -> Result<Vec<SyncConfig>, AppError> {
        let conn = lock_conn!(self.conn);
        let mut stmt = conn
            .prepare(
                "SELECT tool_id, enabled, servers, target_path, is_global, rules_source_id
                 FROM tool_sync_configs ORDER BY tool_id ASC",
            )
            .map_err(|e| AppError::Database(e.to_string()))?;
        let config_iter = stmt
            .query_map([], config_from_row)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut configs = Vec::new();
        for config_res in config_iter {
            configs.push(config_res.map_err(|e| AppError::Database(e.to_string()))?);
        }
        Ok(configs)
    }

    pub fn save_tool_sync_config(&self, config: &SyncConfig) -> Result<(), AppError> {
        let conn = lock_conn!(self.conn);
        let servers = config.servers.as_ref().map(to_json_string).transpose()?;
        conn.execute(
            "INSERT INTO tool_sync_configs (
                tool_id, enabled, servers, target_path, is_global, rules_source_id, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(tool_id) DO UPDATE SET
                enabled = excluded.enabled,
                servers = excluded.servers,
                target_path = excluded.target_path,
                is_global = excluded.is_global,
                rules_source_id = excluded.rules_source_id,
                updated_at = excluded.updated_at",
            params![
                config.tool_id,
                config.enabled,
                servers,
                config.target_path,
                config.global,
                config.rules_source_id,
                now_millis(),
            ],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record which rule was last pushed to a tool; other fields keep their values
    pub fn set_rules_source_id(&self, tool_id: &str, source_id: &str) -> Result<(), AppError> {
        let conn = lock_conn!(self.conn);
        conn.execute(
            "INSERT INTO tool_sync_configs (tool_id, rules_source_id, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(tool_id) DO UPDATE SET
                rules_source_id = excluded.rules_source_id,
                updated_at = excluded.updated_at",
            params![tool_id, source_id, now_millis()],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
