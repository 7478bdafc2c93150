//! Sync orchestration: one tool at a time, or the whole fleet with per-tool
//! failure isolation. Everything runs sequentially on the caller's thread.

mod drift;
mod fleet;
mod mcp;
mod rules;
mod types;

pub use drift::compute_checksum;
pub use fleet::FLEET_TOOL_ID;
pub use types::{
    DriftStatus, SyncConfig, SyncHistoryEntry, SyncKind, SyncResult, SyncStateRecord, SyncStatus,
};

use std::path::Path;

use crate::store::AppState;

pub struct SyncService;

impl SyncService {
    /// Best-effort snapshot of an existing target; failures are logged and swallowed
    fn snapshot_before_write(state: &AppState, label: &str, path: &Path) {
        if !path.exists() {
            return;
        }
        match state.backup.create_snapshot(label, path) {
            Ok(snapshot) => log::debug!("Backed up {} as {}", path.display(), snapshot.id),
            Err(e) => log::warn!("Backup of {} failed, continuing: {e}", path.display()),
        }
    }
}
