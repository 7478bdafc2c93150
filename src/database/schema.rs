use crate::error::AppError;
use rusqlite::Connection;

use super::{lock_conn, Database};

pub(crate) const SCHEMA_VERSION: i32 = 1;

impl Database {
    pub(super) fn create_tables(&self) -> Result<(), AppError> {
        let conn = lock_conn!(self.conn);
        Self::create_tables_on_conn(&conn)
    }

    pub(crate) fn create_tables_on_conn(conn: &Connection) -> Result<(), AppError> {
        // 1. MCP definition pool
        conn.execute(
            "CREATE TABLE IF NOT EXISTS mcp_definitions (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                command TEXT NOT NULL,
                args TEXT NOT NULL DEFAULT '[]',
                env TEXT,
                description TEXT,
                cwd TEXT,
                created_at INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        // 2. MCP sets
        conn.execute(
            "CREATE TABLE IF NOT EXISTS mcp_sets (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 0,
                is_archived BOOLEAN NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        // 3. Set items: weak references into the pool
        conn.execute(
            "CREATE TABLE IF NOT EXISTS mcp_set_items (
                set_id TEXT NOT NULL,
                server_id TEXT NOT NULL,
                disabled BOOLEAN NOT NULL DEFAULT 0,
                order_index INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (set_id, server_id),
                FOREIGN KEY (set_id) REFERENCES mcp_sets(id) ON DELETE CASCADE,
                FOREIGN KEY (server_id) REFERENCES mcp_definitions(id) ON DELETE CASCADE
            )",
            [],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        // 4. Rules
        conn.execute(
            "CREATE TABLE IF NOT EXISTS rules (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                content TEXT NOT NULL,
                order_index INTEGER NOT NULL DEFAULT 0,
                is_archived BOOLEAN NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        // 5. Per-tool sync config
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tool_sync_configs (
                tool_id TEXT PRIMARY KEY,
                enabled BOOLEAN NOT NULL DEFAULT 1,
                servers TEXT,
                target_path TEXT,
                is_global BOOLEAN NOT NULL DEFAULT 1,
                rules_source_id TEXT,
                updated_at INTEGER
            )",
            [],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        // 6. Last synced checksum per target path
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sync_state (
                path TEXT PRIMARY KEY,
                last_sync_hash TEXT NOT NULL,
                synced_at INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        // 7. Append-only audit log of fleet syncs
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sync_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                source_id TEXT,
                strategy TEXT NOT NULL,
                success_count INTEGER NOT NULL DEFAULT 0,
                skipped_count INTEGER NOT NULL DEFAULT 0,
                unsupported_count INTEGER NOT NULL DEFAULT 0,
                error_count INTEGER NOT NULL DEFAULT 0,
                results TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        // 8. Settings (also holds the active set pointer)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT
            )",
            [],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    pub(super) fn apply_schema_migrations(&self) -> Result<(), AppError> {
        let conn = lock_conn!(self.conn);
        Self::apply_schema_migrations_on_conn(&conn)
    }

    pub(crate) fn apply_schema_migrations_on_conn(conn: &Connection) -> Result<(), AppError> {
        conn.execute("SAVEPOINT schema_migration;", [])
            .map_err(|e| AppError::Database(format!("Failed to start migration savepoint: {e}")))?;

        let result = (|| {
            let version = Self::get_user_version(conn)?;
            if version > SCHEMA_VERSION {
                return Err(AppError::Database(format!(
                    "Database version too new ({version}), only supports {SCHEMA_VERSION}, please upgrade."
                )));
            }
            if version < SCHEMA_VERSION {
                log::info!("Detected user_version={version}, stamping baseline schema {SCHEMA_VERSION}");
                Self::set_user_version(conn, SCHEMA_VERSION)?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                conn.execute("RELEASE schema_migration;", [])
                    .map_err(|e| AppError::Database(format!("Failed to commit migration: {e}")))?;
                Ok(())
            }
            Err(e) => {
                conn.execute("ROLLBACK TO schema_migration;", []).ok();
                conn.execute("RELEASE schema_migration;", []).ok();
                Err(e)
            }
        }
    }

    pub(crate) fn get_user_version(conn: &Connection) -> Result<i32, AppError> {
        conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
            .map_err(|e| AppError::Database(format!("Failed to read user_version: {e}")))
    }

    pub(crate) fn set_user_version(conn: &Connection, version: i32) -> Result<(), AppError> {
        if version < 0 {
            return Err(AppError::Database(
                "user_version cannot be negative".to_string(),
            ));
        }
        let sql = format!("PRAGMA user_version = {version};");
        conn.execute(&sql, [])
            .map_err(|e| AppError::Database(format!("Failed to write user_version: {e}")))?;
        Ok(())
    }
}
