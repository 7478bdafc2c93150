use std::collections::HashSet;

use crate::error::AppError;
use crate::mcp::{McpSet, McpSetItem};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::database::{lock_conn, now_millis, Database};

/// Settings key holding the id of the single active set
pub const ACTIVE_MCP_SET_KEY: &str = "active_mcp_set_id";

const SET_COLUMNS: &str =
    "id, name, description, is_active, is_archived, created_at, updated_at";

fn set_from_row(row: &Row<'_>) -> rusqlite::Result<McpSet> {
    Ok(McpSet {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        items: Vec::new(),
        is_active: row.get(3)?,
        is_archived: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Database {
    pub fn get_all_mcp_sets(&self, include_archived: bool) -> Result<Vec<McpSet>, AppError> {
        let conn = lock_conn!(self.conn);
        let sql = format!(
            "SELECT {SET_COLUMNS} FROM mcp_sets
             WHERE ?1 OR is_archived = 0
             ORDER BY created_at ASC, id ASC"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AppError::Database(e.to_string()))?;
        let set_iter = stmt
            .query_map(params![include_archived], set_from_row)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut sets = Vec::new();
        for set_res in set_iter {
            let mut set = set_res.map_err(|e| AppError::Database(e.to_string()))?;
            set.items = Self::load_set_items(&conn, &set.id)?;
            sets.push(set);
        }
        Ok(sets)
    }

    pub fn get_mcp_set(&self, id: &str) -> Result<Option<McpSet>, AppError> {
        let conn = lock_conn!(self.conn);
        Self::load_set_on_conn(&conn, id)
    }

    /// Id stored in the active pointer
    pub fn get_active_mcp_set_id(&self) -> Result<Option<String>, AppError> {
        self.get_setting(ACTIVE_MCP_SET_KEY)
    }

    /// Insert a new set. While no set is active, the first non-archived set stored
    /// becomes active in the same transaction.
    /// Returns the stored set (with `is_active` reflecting the outcome).
    pub fn insert_mcp_set(&self, set: &McpSet) -> Result<McpSet, AppError> {
        let mut conn = lock_conn!(self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(e.to_string()))?;

        let active: i64 = tx
            .query_row("SELECT COUNT(*) FROM mcp_sets WHERE is_active = 1", [], |row| {
                row.get(0)
            })
            .map_err(|e| AppError::Database(e.to_string()))?;
        let activate = active == 0 && !set.is_archived;

        tx.execute(
            "INSERT INTO mcp_sets (id, name, description, is_active, is_archived, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6)",
            params![
                set.id,
                set.name,
                set.description,
                set.is_archived,
                set.created_at,
                set.updated_at,
            ],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        Self::write_set_items(&tx, &set.id, &set.items)?;

        if activate {
            Self::activate_on_conn(&tx, &set.id)?;
        }

        let stored = Self::load_set_on_conn(&tx, &set.id)?
            .ok_or_else(|| AppError::Database(format!("Set '{}' vanished during insert", set.id)))?;
        tx.commit().map_err(|e| AppError::Database(e.to_string()))?;
        Ok(stored)
    }

    /// Persist name/description/archive flag and replace the item list wholesale
    pub fn update_mcp_set(&self, set: &McpSet) -> Result<McpSet, AppError> {
        let mut conn = lock_conn!(self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(e.to_string()))?;

        let current = Self::load_set_on_conn(&tx, &set.id)?
            .ok_or_else(|| AppError::not_found(format!("MCP set '{}'", set.id)))?;
        if current.is_active && set.is_archived {
            return Err(AppError::Conflict(format!(
                "MCP set '{}' is active and cannot be archived",
                current.name
            )));
        }

        tx.execute(
            "UPDATE mcp_sets SET name = ?2, description = ?3, is_archived = ?4, updated_at = ?5
             WHERE id = ?1",
            params![set.id, set.name, set.description, set.is_archived, now_millis()],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        Self::write_set_items(&tx, &set.id, &set.items)?;

        let stored = Self::load_set_on_conn(&tx, &set.id)?
            .ok_or_else(|| AppError::Database(format!("Set '{}' vanished during update", set.id)))?;
        tx.commit().map_err(|e| AppError::Database(e.to_string()))?;
        Ok(stored)
    }

    /// Delete a set. The active set is never deleted; activate another one first.
    pub fn delete_mcp_set(&self, id: &str) -> Result<(), AppError> {
        let mut conn = lock_conn!(self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(e.to_string()))?;

        let current = Self::load_set_on_conn(&tx, id)?
            .ok_or_else(|| AppError::not_found(format!("MCP set '{id}'")))?;
        let pointer = Self::read_setting_on_conn(&tx, ACTIVE_MCP_SET_KEY)?;
        if current.is_active || pointer.as_deref() == Some(id) {
            return Err(AppError::Conflict(format!(
                "MCP set '{}' is active; activate another set before deleting it",
                current.name
            )));
        }

        tx.execute("DELETE FROM mcp_sets WHERE id = ?1", params![id])
            .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Make `id` the only active set and repoint the active pointer, atomically
    pub fn set_active_mcp_set(&self, id: &str) -> Result<(), AppError> {
        let mut conn = lock_conn!(self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(e.to_string()))?;

        let target = Self::load_set_on_conn(&tx, id)?
            .ok_or_else(|| AppError::not_found(format!("MCP set '{id}'")))?;
        if target.is_archived {
            return Err(AppError::validation(format!(
                "MCP set '{}' is archived and cannot be activated",
                target.name
            )));
        }

        Self::activate_on_conn(&tx, id)?;

        tx.commit().map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    fn activate_on_conn(conn: &Connection, id: &str) -> Result<(), AppError> {
        conn.execute("UPDATE mcp_sets SET is_active = 0 WHERE id <> ?1", params![id])
            .map_err(|e| AppError::Database(e.to_string()))?;
        conn.execute("UPDATE mcp_sets SET is_active = 1 WHERE id = ?1", params![id])
            .map_err(|e| AppError::Database(e.to_string()))?;
        Self::write_setting_on_conn(conn, ACTIVE_MCP_SET_KEY, id)
    }

    pub(crate) fn load_set_on_conn(conn: &Connection, id: &str) -> Result<Option<McpSet>, AppError> {
        let sql = format!("SELECT {SET_COLUMNS} FROM mcp_sets WHERE id = ?1");
        let set = conn
            .query_row(&sql, params![id], set_from_row)
            .optional()
            .map_err(|e| AppError::Database(e.to_string()))?;

        match set {
            Some(mut set) => {
                set.items = Self::load_set_items(conn, &set.id)?;
                Ok(Some(set))
            }
            None => Ok(None),
        }
    }

    fn load_set_items(conn: &Connection, set_id: &str) -> Result<Vec<McpSetItem>, AppError> {
        let mut stmt = conn
            .prepare(
                "SELECT server_id, disabled, order_index FROM mcp_set_items
                 WHERE set_id = ?1 ORDER BY order_index ASC, server_id ASC",
            )
            .map_err(|e| AppError::Database(e.to_string()))?;
        let item_iter = stmt
            .query_map(params![set_id], |row| {
                Ok(McpSetItem {
                    server_id: row.get(0)?,
                    disabled: row.get(1)?,
                    order_index: row.get(2)?,
                })
            })
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for item_res in item_iter {
            items.push(item_res.map_err(|e| AppError::Database(e.to_string()))?);
        }
        Ok(items)
    }

    /// Replace a set's items. Every referenced definition must exist at write time;
    /// order indexes are reassigned from list position.
    fn write_set_items(conn: &Connection, set_id: &str, items: &[McpSetItem]) -> Result<(), AppError> {
        let mut seen = HashSet::new();
        for item in items {
            if !seen.insert(item.server_id.as_str()) {
                return Err(AppError::validation(format!(
                    "MCP server '{}' appears more than once in the set",
                    item.server_id
                )));
            }
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM mcp_definitions WHERE id = ?1)",
                    params![item.server_id],
                    |row| row.get(0),
                )
                .map_err(|e| AppError::Database(e.to_string()))?;
            if !exists {
                return Err(AppError::not_found(format!(
                    "MCP definition '{}' referenced by set item",
                    item.server_id
                )));
            }
        }

        conn.execute("DELETE FROM mcp_set_items WHERE set_id = ?1", params![set_id])
            .map_err(|e| AppError::Database(e.to_string()))?;

        for (index, item) in items.iter().enumerate() {
            conn.execute(
                "INSERT INTO mcp_set_items (set_id, server_id, disabled, order_index)
                 VALUES (?1, ?2, ?3, ?4)",
                params![set_id, item.server_id, item.disabled, index as i64],
            )
            .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }
}
