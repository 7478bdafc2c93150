use std::path::PathBuf;

use crate::config::{read_text_file, write_text_file};
use crate::error::AppError;
use crate::paths::{resolve_target_path, SyncTarget, TargetKind};
use crate::store::AppState;
use crate::strategy::{apply_text_strategy, SyncStrategy};

use super::SyncService;

impl SyncService {
    /// Write rule `source_id` into `tool_id`'s rules file.
    ///
    /// Returns the written path, or `None` when the rule has no content.
    pub fn sync_one_rules(
        state: &AppState,
        tool_id: &str,
        target: &SyncTarget,
        strategy: SyncStrategy,
        source_id: &str,
    ) -> Result<Option<PathBuf>, AppError> {
        if source_id.trim().is_empty() {
            return Err(AppError::validation("sourceId is required for rules sync"));
        }

        let rule = state
            .db
            .get_rule(source_id)?
            .ok_or_else(|| AppError::not_found(format!("Rule '{source_id}'")))?;
        if rule.content.trim().is_empty() {
            log::warn!("Rule '{}' is empty, nothing synced to {tool_id}", rule.name);
            return Ok(None);
        }

        let path = resolve_target_path(&state.registry, &target.to_spec(tool_id, TargetKind::Rules))?;
        let current = read_text_file(&path)?;
        let output = apply_text_strategy(current.as_deref().unwrap_or(""), &rule.content, strategy)?;

        Self::warn_on_drift(state, &path, current.as_deref());
        Self::snapshot_before_write(state, &format!("rules-{tool_id}"), &path);
        write_text_file(&path, &output)?;
        Self::record_written(state, &path, &output)?;

        if let Err(e) = state.db.set_rules_source_id(tool_id, source_id) {
            log::warn!("Failed to remember rules source for {tool_id}: {e}");
        }

        log::info!(
            "Synced rule '{}' to {} ({}, {strategy})",
            rule.name,
            path.display(),
            tool_id
        );
        Ok(Some(path))
    }
}
