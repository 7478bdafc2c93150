use sha2::{Digest, Sha256};
use std::path::Path;

use crate::config::read_text_file;
use crate::database::now_millis;
use crate::error::AppError;
use crate::store::AppState;

use super::{DriftStatus, SyncService};

/// Lowercase hex SHA-256 of `content`
pub fn compute_checksum(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Key under which sync state is stored for a path
pub(super) fn state_key(path: &Path) -> String {
    path.display().to_string()
}

impl SyncService {
    /// Compare a file with the checksum recorded at its last sync
    pub fn check_drift(state: &AppState, path: &Path) -> Result<DriftStatus, AppError> {
        let Some(record) = state.db.get_sync_state(&state_key(path))? else {
            return Ok(DriftStatus::Untracked);
        };
        let Some(current) = read_text_file(path)? else {
            return Ok(DriftStatus::Missing);
        };
        if compute_checksum(&current) == record.last_sync_hash {
            Ok(DriftStatus::Clean)
        } else {
            Ok(DriftStatus::Drifted)
        }
    }

    /// Warn when the file changed since the last recorded sync. Never blocks the write.
    pub(super) fn warn_on_drift(state: &AppState, path: &Path, current: Option<&str>) {
        let Some(current) = current else {
            return;
        };
        match state.db.get_sync_state(&state_key(path)) {
            Ok(Some(record)) if compute_checksum(current) != record.last_sync_hash => {
                log::warn!(
                    "Drift detected at {}: file changed since last sync, overwriting",
                    path.display()
                );
            }
            Ok(_) => {}
            Err(e) => log::debug!("Drift check skipped for {}: {e}", path.display()),
        }
    }

    pub(super) fn record_written(state: &AppState, path: &Path, content: &str) -> Result<(), AppError> {
        state
            .db
            .record_sync_state(&state_key(path), &compute_checksum(content), now_millis())
    }
}
