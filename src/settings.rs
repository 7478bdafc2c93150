use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::expand_home;
use crate::database::Database;
use crate::error::AppError;

const APP_SETTINGS_KEY: &str = "app_settings";

/// User-level preferences persisted alongside the sync data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_backups_enabled")]
    pub backups_enabled: bool,
    /// Snapshot directories kept per backup root
    #[serde(default = "default_backup_retain")]
    pub backup_retain: usize,
    /// Re-roots a builtin tool's config directory, keyed by tool id
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub tool_dir_overrides: IndexMap<String, String>,
    /// Project root used when a tool is configured for project scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_project_root: Option<String>,
}

fn default_backups_enabled() -> bool {
    true
}

fn default_backup_retain() -> usize {
    10
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backups_enabled: default_backups_enabled(),
            backup_retain: default_backup_retain(),
            tool_dir_overrides: IndexMap::new(),
            default_project_root: None,
        }
    }
}

impl AppSettings {
    fn normalize_paths(&mut self) {
        self.tool_dir_overrides = self
            .tool_dir_overrides
            .iter()
            .map(|(id, dir)| (id.trim().to_string(), dir.trim().to_string()))
            .filter(|(id, dir)| !id.is_empty() && !dir.is_empty())
            .collect();

        self.default_project_root = self
            .default_project_root
            .as_ref()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
    }

    /// Stored settings, or defaults when the row is missing or unreadable
    pub fn load(db: &Database) -> Self {
        match db.get_setting(APP_SETTINGS_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<AppSettings>(&json) {
                Ok(mut settings) => {
                    settings.normalize_paths();
                    settings
                }
                Err(err) => {
                    log::warn!("Failed to parse stored app settings, using defaults: {err}");
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(err) => {
                log::warn!("Failed to read app settings, using defaults: {err}");
                Self::default()
            }
        }
    }

    pub fn save(&self, db: &Database) -> Result<(), AppError> {
        let mut normalized = self.clone();
        normalized.normalize_paths();
        let json = serde_json::to_string(&normalized)
            .map_err(|e| AppError::JsonSerialize { source: e })?;
        db.set_setting(APP_SETTINGS_KEY, &json)
    }

    /// Config directory override for a tool, with `~` expanded
    pub fn tool_dir_override(&self, tool_id: &str) -> Option<PathBuf> {
        self.tool_dir_overrides
            .get(tool_id)
            .map(|dir| dir.trim())
            .filter(|dir| !dir.is_empty())
            .map(expand_home)
    }

    pub fn project_root(&self) -> Option<PathBuf> {
        self.default_project_root.as_deref().map(expand_home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_settings_use_defaults() {
        let db = Database::memory().expect("db");
        let settings = AppSettings::load(&db);
        assert!(settings.backups_enabled);
        assert_eq!(settings.backup_retain, 10);
    }

    #[test]
    fn corrupt_settings_fall_back_to_defaults() {
        let db = Database::memory().expect("db");
        db.set_setting(APP_SETTINGS_KEY, "{not json").expect("seed");
        assert_eq!(AppSettings::load(&db), AppSettings::default());
    }

    #[test]
    fn save_normalizes_blank_entries() {
        let db = Database::memory().expect("db");
        let mut settings = AppSettings::default();
        settings.backup_retain = 3;
        settings
            .tool_dir_overrides
            .insert(" codex ".into(), " /opt/codex ".into());
        settings.tool_dir_overrides.insert("gemini".into(), "   ".into());
        settings.default_project_root = Some("  ".into());

        settings.save(&db).expect("save");
        let loaded = AppSettings::load(&db);

        assert_eq!(loaded.backup_retain, 3);
        assert_eq!(
            loaded.tool_dir_override("codex"),
            Some(PathBuf::from("/opt/codex"))
        );
        assert_eq!(loaded.tool_dir_override("gemini"), None);
        assert_eq!(loaded.default_project_root, None);
    }
}
