use crate::error::AppError;
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::{lock_conn, Database};

impl Database {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, AppError> {
        let conn = lock_conn!(self.conn);
        Self::read_setting_on_conn(&conn, key)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), AppError> {
        let conn = lock_conn!(self.conn);
        Self::write_setting_on_conn(&conn, key, value)
    }

    pub fn delete_setting(&self, key: &str) -> Result<(), AppError> {
        let conn = lock_conn!(self.conn);
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub(crate) fn read_setting_on_conn(
        conn: &Connection,
        key: &str,
    ) -> Result<Option<String>, AppError> {
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()
        .map(Option::flatten)
        .map_err(|e| AppError::Database(e.to_string()))
    }

    pub(crate) fn write_setting_on_conn(
        conn: &Connection,
        key: &str,
        value: &str,
    ) -> Result<(), AppError> {
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
