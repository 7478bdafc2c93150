use std::sync::Arc;

use crate::config::get_backups_dir;
use crate::database::Database;
use crate::error::AppError;
use crate::services::backup::{FileSnapshotBackup, NoopBackup, SnapshotBackup};
use crate::settings::AppSettings;
use crate::tool_registry::ToolRegistry;

/// Shared handles every service call receives
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub registry: Arc<ToolRegistry>,
    pub backup: Arc<dyn SnapshotBackup>,
}

impl AppState {
    pub fn new(db: Arc<Database>, registry: ToolRegistry, backup: Arc<dyn SnapshotBackup>) -> Self {
        Self {
            db,
            registry: Arc::new(registry),
            backup,
        }
    }

    /// Open the on-disk database and build the registry and backup collaborator from stored settings
    pub fn init() -> Result<Self, AppError> {
        let db = Arc::new(Database::init()?);
        let settings = AppSettings::load(&db);
        let registry = ToolRegistry::builtin(&settings)?;
        let backup: Arc<dyn SnapshotBackup> = if settings.backups_enabled {
            Arc::new(FileSnapshotBackup::new(
                get_backups_dir()?,
                settings.backup_retain,
            ))
        } else {
            Arc::new(NoopBackup)
        };
        log::info!(
            "Sync state initialized with {} tools (backups {})",
            registry.len(),
            if settings.backups_enabled { "on" } else { "off" }
        );
        Ok(Self::new(db, registry, backup))
    }

    pub fn settings(&self) -> AppSettings {
        AppSettings::load(&self.db)
    }
}
