use std::path::{Path, PathBuf};

use crate::config::expand_home;
use crate::database::now_millis;
use crate::error::AppError;
use crate::paths::{resolve_target_path, SyncTarget, TargetKind, TargetSpec};
use crate::settings::AppSettings;
use crate::store::AppState;
use crate::strategy::SyncStrategy;
use crate::tool_registry::ToolMetadata;

use super::{SyncConfig, SyncHistoryEntry, SyncKind, SyncResult, SyncService};

/// Tool id carried by the single result returned when a fleet run cannot start
pub const FLEET_TOOL_ID: &str = "fleet";

/// Gate shared by both fleet kinds: registered, installed, enabled
enum Gate<'a> {
    Proceed(&'a ToolMetadata, SyncConfig),
    Stop(SyncResult),
}

impl SyncService {
    /// Push MCP set `source_id` to every tool in `tool_ids` (all registered tools when empty).
    ///
    /// Never fails: each tool yields one result, and a missing source yields a
    /// single error result without touching any tool.
    pub fn sync_fleet_mcp(
        state: &AppState,
        source_id: Option<&str>,
        tool_ids: &[String],
        strategy: SyncStrategy,
    ) -> Vec<SyncResult> {
        let Some(source_id) = source_id.map(str::trim).filter(|s| !s.is_empty()) else {
            return vec![SyncResult::error(
                FLEET_TOOL_ID,
                "sourceId is required for fleet MCP sync",
            )];
        };

        let ids = if tool_ids.is_empty() {
            state.registry.ids()
        } else {
            tool_ids.to_vec()
        };
        let settings = state.settings();

        let mut results = Vec::with_capacity(ids.len());
        for tool_id in &ids {
            results.push(Self::fleet_mcp_unit(
                state, &settings, tool_id, source_id, strategy,
            ));
        }

        Self::append_history(state, SyncKind::Mcp, source_id, strategy, &results);
        results
    }

    /// Push rule `source_id` to every registered tool, into each tool's global
    /// rules file or, with `project_root`, into the project's rules files.
    pub fn sync_fleet_rules(
        state: &AppState,
        project_root: Option<&Path>,
        strategy: SyncStrategy,
        source_id: Option<&str>,
    ) -> Vec<SyncResult> {
        let Some(source_id) = source_id.map(str::trim).filter(|s| !s.is_empty()) else {
            return vec![SyncResult::error(
                FLEET_TOOL_ID,
                "sourceId is required for fleet rules sync",
            )];
        };

        let target = match project_root {
            Some(root) => SyncTarget::Project(root.to_path_buf()),
            None => SyncTarget::Global,
        };

        let mut results = Vec::with_capacity(state.registry.len());
        for tool_id in state.registry.ids() {
            results.push(Self::fleet_rules_unit(
                state, &tool_id, &target, strategy, source_id,
            ));
        }

        Self::append_history(state, SyncKind::Rules, source_id, strategy, &results);
        results
    }

    fn gate<'a>(state: &'a AppState, tool_id: &str) -> Gate<'a> {
        let Some(tool) = state.registry.get(tool_id) else {
            return Gate::Stop(SyncResult::error(
                tool_id,
                format!("Tool '{tool_id}' is not registered"),
            ));
        };
        if !state.registry.is_installed(tool) {
            return Gate::Stop(SyncResult::skipped(tool_id, "tool is not installed"));
        }
        let config = match state.db.get_tool_sync_config(tool_id) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load sync config for {tool_id}: {e}");
                return Gate::Stop(SyncResult::error(tool_id, e.to_string()));
            }
        };
        if !config.enabled {
            return Gate::Stop(SyncResult::skipped(tool_id, "sync is disabled for this tool"));
        }
        Gate::Proceed(tool, config)
    }

    fn fleet_mcp_unit(
        state: &AppState,
        settings: &AppSettings,
        tool_id: &str,
        source_id: &str,
        strategy: SyncStrategy,
    ) -> SyncResult {
        let (tool, config) = match Self::gate(state, tool_id) {
            Gate::Proceed(tool, config) => (tool, config),
            Gate::Stop(result) => return result,
        };
        if !tool.supports_mcp {
            return SyncResult::unsupported(tool_id, "tool does not support MCP servers");
        }

        let outcome = Self::mcp_target_for(state, settings, &config).and_then(|path| {
            Self::sync_one_mcp(
                state,
                tool_id,
                &path,
                config.servers.as_deref(),
                strategy,
                source_id,
            )
            .map(|applied| (path, applied))
        });

        match outcome {
            Ok((path, applied)) => {
                let result = SyncResult::success(tool_id, &path);
                if applied.is_empty() {
                    result
                        .with_applied(applied)
                        .with_message("no servers selected, file left untouched")
                } else {
                    result.with_applied(applied)
                }
            }
            Err(e) => {
                log::error!("MCP sync failed for {tool_id}: {e}");
                SyncResult::error(tool_id, e.to_string())
            }
        }
    }

    fn fleet_rules_unit(
        state: &AppState,
        tool_id: &str,
        target: &SyncTarget,
        strategy: SyncStrategy,
        source_id: &str,
    ) -> SyncResult {
        let tool = match Self::gate(state, tool_id) {
            Gate::Proceed(tool, _) => tool,
            Gate::Stop(result) => return result,
        };
        let supported = match target {
            SyncTarget::Project(_) => tool.project_rules_filename.is_some(),
            SyncTarget::Global | SyncTarget::Path(_) => tool.supports_rules(),
        };
        if !supported {
            return SyncResult::unsupported(tool_id, "tool has no rules file for this scope");
        }

        match Self::sync_one_rules(state, tool_id, target, strategy, source_id) {
            Ok(Some(path)) => SyncResult::success(tool_id, &path),
            Ok(None) => SyncResult::skipped(tool_id, "rule content is empty"),
            Err(e) => {
                log::error!("Rules sync failed for {tool_id}: {e}");
                SyncResult::error(tool_id, e.to_string())
            }
        }
    }

    /// Target for a fleet MCP sync, driven by the tool's stored config
    fn mcp_target_for(
        state: &AppState,
        settings: &AppSettings,
        config: &SyncConfig,
    ) -> Result<PathBuf, AppError> {
        let mut spec = TargetSpec::new(&config.tool_id, TargetKind::Mcp).global(config.global);
        if let Some(path) = config
            .target_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            spec = spec.override_path(expand_home(path));
        }
        if !config.global {
            if let Some(root) = settings.project_root() {
                spec = spec.project_root(root);
            }
        }
        resolve_target_path(&state.registry, &spec)
    }

    fn append_history(
        state: &AppState,
        kind: SyncKind,
        source_id: &str,
        strategy: SyncStrategy,
        results: &[SyncResult],
    ) {
        let entry = SyncHistoryEntry::summarize(
            kind,
            Some(source_id),
            strategy.as_str(),
            results,
            now_millis(),
        );
        log::info!(
            "Fleet {kind} sync finished: {} ok, {} skipped, {} unsupported, {} failed",
            entry.success_count,
            entry.skipped_count,
            entry.unsupported_count,
            entry.error_count
        );
        if let Err(e) = state.db.append_sync_history(&entry) {
            log::warn!("Failed to record sync history: {e}");
        }
    }
}
