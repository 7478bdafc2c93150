use crate::error::AppError;
use crate::mcp::McpDefinition;
use indexmap::IndexMap;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::database::{lock_conn, now_millis, to_json_string, Database};

const DEFINITION_COLUMNS: &str = "id, name, command, args, env, description, cwd";

fn definition_from_row(row: &Row<'_>) -> rusqlite::Result<McpDefinition> {
    let args_str: String = row.get(3)?;
    let env_str: Option<String> = row.get(4)?;

    Ok(McpDefinition {
        id: row.get(0)?,
        name: row.get(1)?,
        command: row.get(2)?,
        args: serde_json::from_str(&args_str).unwrap_or_default(),
        env: env_str.and_then(|s| serde_json::from_str(&s).ok()),
        description: row.get(5)?,
        cwd: row.get(6)?,
    })
}

impl Database {
    pub fn get_all_mcp_definitions(&self) -> Result<IndexMap<String, McpDefinition>, AppError> {
        let conn = lock_conn!(self.conn);
        Self::load_definitions_on_conn(&conn)
    }

    pub(crate) fn load_definitions_on_conn(
        conn: &Connection,
    ) -> Result<IndexMap<String, McpDefinition>, AppError> {
        let sql = format!(
            "SELECT {DEFINITION_COLUMNS} FROM mcp_definitions ORDER BY name ASC, id ASC"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let def_iter = stmt
            .query_map([], definition_from_row)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut definitions = IndexMap::new();
        for def_res in def_iter {
            let def = def_res.map_err(|e| AppError::Database(e.to_string()))?;
            definitions.insert(def.id.clone(), def);
        }
        Ok(definitions)
    }

    pub fn get_mcp_definition(&self, id: &str) -> Result<Option<McpDefinition>, AppError> {
        let conn = lock_conn!(self.conn);
        let sql = format!("SELECT {DEFINITION_COLUMNS} FROM mcp_definitions WHERE id = ?1");
        conn.query_row(&sql, params![id], definition_from_row)
            .optional()
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub fn find_mcp_definition_by_name(
        &self,
        name: &str,
    ) -> Result<Option<McpDefinition>, AppError> {
        let conn = lock_conn!(self.conn);
        let sql = format!("SELECT {DEFINITION_COLUMNS} FROM mcp_definitions WHERE name = ?1");
        conn.query_row(&sql, params![name], definition_from_row)
            .optional()
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or update in place. An UPSERT is used instead of `INSERT OR REPLACE`
    /// because REPLACE deletes the row first and would cascade into set items.
    pub fn save_mcp_definition(&self, def: &McpDefinition) -> Result<(), AppError> {
        let conn = lock_conn!(self.conn);
        let now = now_millis();
        let env = def.env.as_ref().map(to_json_string).transpose()?;
        conn.execute(
            "INSERT INTO mcp_definitions (
                id, name, command, args, env, description, cwd, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                command = excluded.command,
                args = excluded.args,
                env = excluded.env,
                description = excluded.description,
                cwd = excluded.cwd,
                updated_at = excluded.updated_at",
            params![
                def.id,
                def.name,
                def.command,
                to_json_string(&def.args)?,
                env,
                def.description,
                def.cwd,
                now,
            ],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a definition and prune every set item referencing it in one transaction.
    /// Returns the number of pruned set items.
    pub fn delete_mcp_definition(&self, id: &str) -> Result<usize, AppError> {
        let mut conn = lock_conn!(self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(e.to_string()))?;

        let exists: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM mcp_definitions WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Database(e.to_string()))?;
        if !exists {
            return Err(AppError::not_found(format!("MCP definition '{id}'")));
        }

        let pruned = tx
            .execute(
                "DELETE FROM mcp_set_items WHERE server_id = ?1",
                params![id],
            )
            .map_err(|e| AppError::Database(e.to_string()))?;

        tx.execute("DELETE FROM mcp_definitions WHERE id = ?1", params![id])
            .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().map_err(|e| AppError::Database(e.to_string()))?;
        Ok(pruned)
    }
}
