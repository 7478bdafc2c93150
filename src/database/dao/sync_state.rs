use crate::error::AppError;
use crate::services::sync::SyncStateRecord;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{lock_conn, Database};

fn state_from_row(row: &Row<'_>) -> rusqlite::Result<SyncStateRecord> {
    Ok(SyncStateRecord {
        path: row.get(0)?,
        last_sync_hash: row.get(1)?,
        synced_at: row.get(2)?,
    })
}

impl Database {
    pub fn get_sync_state(&self, path: &str) -> Result<Option<SyncStateRecord>, AppError> {
        let conn = lock_conn!(self.conn);
        conn.query_row(
            "SELECT path, last_sync_hash, synced_at FROM sync_state WHERE path = ?1",
            params![path],
            state_from_row,
        )
        .optional()
        .map_err(|e| AppError::Database(e.to_string()))
    }

    pub fn record_sync_state(&self, path: &str, hash: &str, synced_at: i64) -> Result<(), AppError> {
        let conn = lock_conn!(self.conn);
        conn.execute(
            "INSERT INTO sync_state (path, last_sync_hash, synced_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(path) DO UPDATE SET
                last_sync_hash = excluded.last_sync_hash,
                synced_at = excluded.synced_at",
            params![path, hash, synced_at],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn list_sync_states(&self) -> Result<Vec<SyncStateRecord>, AppError> {
        let conn = lock_conn!(self.conn);
        let mut stmt = conn
            .prepare("SELECT path, last_sync_hash, synced_at FROM sync_state ORDER BY path ASC")
            .map_err(|e| AppError::Database(e.to_string()))?;
        let state_iter = stmt
            .query_map([], state_from_row)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut states = Vec::new();
        for state_res in state_iter {
            states.push(state_res.map_err(|e| AppError::Database(e.to_string()))?);
        }
        Ok(states)
    }
}
