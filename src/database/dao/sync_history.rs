use crate::error::AppError;
use crate::services::sync::{SyncHistoryEntry, SyncKind};
use rusqlite::params;

use crate::database::{lock_conn, to_json_string, Database};

impl Database {
    /// Append one audit record; returns its row id. Rows are never updated or deleted.
    pub fn append_sync_history(&self, entry: &SyncHistoryEntry) -> Result<i64, AppError> {
        let conn = lock_conn!(self.conn);
        conn.execute(
            "INSERT INTO sync_history (
                kind, source_id, strategy, success_count, skipped_count,
                unsupported_count, error_count, results, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.kind.as_str(),
                entry.source_id,
                entry.strategy,
                entry.success_count,
                entry.skipped_count,
                entry.unsupported_count,
                entry.error_count,
                to_json_string(&entry.results)?,
                entry.created_at,
            ],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(conn.last_insert_rowid())
    }

    /// Newest first
    pub fn list_sync_history(&self, limit: usize) -> Result<Vec<SyncHistoryEntry>, AppError> {
        let conn = lock_conn!(self.conn);
        let mut stmt = conn
            .prepare(
                "SELECT id, kind, source_id, strategy, success_count, skipped_count,
                        unsupported_count, error_count, results, created_at
                 FROM sync_history ORDER BY created_at DESC, id DESC LIMIT ?1",
            )
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row_iter = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    [
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                    ],
                    row.get::<_, String>(8)?,
                    row.get::<_, i64>(9)?,
                ))
            })
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row_res in row_iter {
            let (id, kind, source_id, strategy, counts, results, created_at) =
                row_res.map_err(|e| AppError::Database(e.to_string()))?;
            let kind: SyncKind = kind.parse()?;
            let results = serde_json::from_str(&results).unwrap_or_else(|e| {
                log::warn!("Unreadable results in sync history row {id}: {e}");
                Vec::new()
            });
            entries.push(SyncHistoryEntry {
                id,
                kind,
                source_id,
                strategy,
                success_count: counts[0],
                skipped_count: counts[1],
                unsupported_count: counts[2],
                error_count: counts[3],
                results,
                created_at,
            });
        }
        Ok(entries)
    }
}
