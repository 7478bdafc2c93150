mod config;
mod database;
mod error;
mod mcp;
mod paths;
mod rule;
mod services;
mod settings;
mod store;
mod strategy;
mod tool_registry;

pub use config::{
    atomic_write, expand_home, get_app_config_dir, get_backups_dir, get_database_path,
    read_text_file, write_text_file, CONFIG_DIR_ENV,
};
pub use database::Database;
pub use error::AppError;
pub use mcp::{
    ConfigDocument, McpDefinition, McpDefinitionPatch, McpSet, McpSetItem, McpSetPatch,
    SyncFormat,
};
pub use paths::{resolve_target_path, SyncTarget, TargetKind, TargetSpec};
pub use rule::{Rule, RulePatch};
pub use services::sync::{
    compute_checksum, DriftStatus, SyncConfig, SyncHistoryEntry, SyncKind, SyncResult,
    SyncStateRecord, SyncStatus, FLEET_TOOL_ID,
};
pub use services::{
    FileSnapshotBackup, McpService, NoopBackup, RuleService, SnapshotBackup, SnapshotRef,
    SyncService,
};
pub use settings::AppSettings;
pub use store::AppState;
pub use strategy::{
    apply_server_strategy, apply_text_strategy, apply_text_strategy_named, deep_merge_server_map,
    SyncStrategy, MARKER_END, MARKER_START,
};
pub use tool_registry::{ToolMetadata, ToolRegistry};
