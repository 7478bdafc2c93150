use crate::error::AppError;
use rusqlite::backup::Backup;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

use super::{lock_conn, Database};

impl Database {
    /// Take a consistent copy of the store into `dir`, keeping the `retain` newest copies
    pub fn backup_to_dir(&self, dir: &Path, retain: usize) -> Result<PathBuf, AppError> {
        fs::create_dir_all(dir).map_err(|e| AppError::io(dir, e))?;

        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%3f");
        let mut backup_path = dir.join(format!("store_{stamp}.db"));
        let mut suffix = 1;
        while backup_path.exists() {
            backup_path = dir.join(format!("store_{stamp}_{suffix}.db"));
            suffix += 1;
        }

        {
            let conn = lock_conn!(self.conn);
            let mut dest_conn =
                Connection::open(&backup_path).map_err(|e| AppError::Database(e.to_string()))?;
            let backup = Backup::new(&conn, &mut dest_conn)
                .map_err(|e| AppError::Database(e.to_string()))?;
            backup
                .step(-1)
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        Self::cleanup_store_backups(dir, retain.max(1));
        log::info!("Store backed up to {}", backup_path.display());
        Ok(backup_path)
    }

    fn cleanup_store_backups(dir: &Path, retain: usize) {
        let mut entries = match fs::read_dir(dir) {
            Ok(iter) => iter
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.extension().map(|ext| ext == "db").unwrap_or(false)
                        && path
                            .file_name()
                            .map(|n| n.to_string_lossy().starts_with("store_"))
                            .unwrap_or(false)
                })
                .collect::<Vec<_>>(),
            Err(_) => return,
        };

        if entries.len() <= retain {
            return;
        }

        // timestamped names sort chronologically
        entries.sort();
        let remove_count = entries.len() - retain;
        for path in entries.into_iter().take(remove_count) {
            if let Err(err) = fs::remove_file(&path) {
                log::warn!("Failed to delete old store backup {}: {}", path.display(), err);
            }
        }
    }
}
