#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use cli_sync_lib::{
    AppState, Database, FileSnapshotBackup, McpDefinition, McpService, NoopBackup,
    SnapshotBackup, SyncFormat, ToolMetadata, ToolRegistry,
};

/// Isolated HOME so nothing touches real user config.
pub fn ensure_test_home() -> &'static Path {
    static HOME: OnceLock<PathBuf> = OnceLock::new();
    HOME.get_or_init(|| {
        let base = std::env::temp_dir().join("cli-sync-test-home");
        if base.exists() {
            let _ = std::fs::remove_dir_all(&base);
        }
        std::fs::create_dir_all(&base).expect("create test home");
        std::env::set_var("HOME", &base);
        #[cfg(windows)]
        std::env::set_var("USERPROFILE", &base);
        base
    })
    .as_path()
}

/// Serializes tests that share the process environment.
pub fn test_mutex() -> &'static Mutex<()> {
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX.get_or_init(|| Mutex::new(()))
}

/// JSON tool whose files all live under `dir`
pub fn json_tool(id: &str, dir: &Path) -> ToolMetadata {
    let mut tool = ToolMetadata::new(id, id, SyncFormat::Json);
    tool.config_paths = vec![dir.join(id).join("settings.json")];
    tool.rules_filename = Some("RULES.md".into());
    tool.global_rules_dir = Some(dir.join(id));
    tool.project_rules_filename = Some(format!("{}.md", id.to_uppercase()));
    tool.project_relative_mcp_filename = Some(format!(".{id}/mcp.json"));
    tool.supports_mcp = true;
    tool
}

/// TOML tool without project-scoped MCP
pub fn toml_tool(id: &str, dir: &Path) -> ToolMetadata {
    let mut tool = ToolMetadata::new(id, id, SyncFormat::Toml);
    tool.config_paths = vec![dir.join(id).join("config.toml")];
    tool.rules_filename = Some("AGENTS.md".into());
    tool.global_rules_dir = Some(dir.join(id));
    tool.project_rules_filename = Some("AGENTS.md".into());
    tool.supports_mcp = true;
    tool
}

/// Rules-only tool
pub fn rules_only_tool(id: &str, dir: &Path) -> ToolMetadata {
    let mut tool = ToolMetadata::new(id, id, SyncFormat::Json);
    tool.rules_filename = Some("global_rules.md".into());
    tool.global_rules_dir = Some(dir.join(id));
    tool
}

pub fn create_test_state(tools: Vec<ToolMetadata>) -> AppState {
    create_test_state_with_backup(tools, Arc::new(NoopBackup))
}

pub fn create_test_state_with_backup(
    tools: Vec<ToolMetadata>,
    backup: Arc<dyn SnapshotBackup>,
) -> AppState {
    let db = Database::memory().expect("in-memory database");
    AppState::new(Arc::new(db), ToolRegistry::from_tools(tools), backup)
}

pub fn file_backup(dir: &Path) -> Arc<FileSnapshotBackup> {
    Arc::new(FileSnapshotBackup::new(dir.join("backups"), 10))
}

pub fn definition(name: &str, command: &str, args: &[&str]) -> McpDefinition {
    McpDefinition {
        id: String::new(),
        name: name.to_string(),
        command: command.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        env: None,
        description: None,
        cwd: None,
    }
}

pub fn seed_definition(state: &AppState, name: &str, command: &str, args: &[&str]) -> McpDefinition {
    McpService::create_definition(state, definition(name, command, args)).expect("create definition")
}
