//! Per-tool capability facts: where each client keeps its MCP config and
//! rules file, in which format, and whether it understands MCP at all.
//!
//! The registry is built once at startup and consumed read-only by the sync
//! services.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::mcp::SyncFormat;
use crate::settings::AppSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct ToolMetadata {
    pub id: String,
    pub name: String,
    /// Declared format of the tool's MCP config
    pub format: SyncFormat,
    pub config_paths: Vec<PathBuf>,
    /// Dedicated MCP file when it differs from the main config
    pub mcp_config_path: Option<PathBuf>,
    pub rules_filename: Option<String>,
    pub global_rules_dir: Option<PathBuf>,
    /// Rules filename used inside a project root
    pub project_rules_filename: Option<String>,
    pub project_relative_mcp_filename: Option<String>,
    pub supports_mcp: bool,
    /// Existence of this directory means the tool is installed; `None` treats it as always installed
    pub detect_dir: Option<PathBuf>,
}

impl ToolMetadata {
    /// Bare metadata with nothing declared; builtins and tests fill in the rest
    pub fn new(id: impl Into<String>, name: impl Into<String>, format: SyncFormat) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            format,
            config_paths: Vec::new(),
            mcp_config_path: None,
            rules_filename: None,
            global_rules_dir: None,
            project_rules_filename: None,
            project_relative_mcp_filename: None,
            supports_mcp: false,
            detect_dir: None,
        }
    }

    /// Global MCP target: the dedicated MCP file, else the first config path
    pub fn global_mcp_path(&self) -> Option<PathBuf> {
        self.mcp_config_path
            .clone()
            .or_else(|| self.config_paths.first().cloned())
    }

    pub fn global_rules_path(&self) -> Option<PathBuf> {
        match (&self.global_rules_dir, &self.rules_filename) {
            (Some(dir), Some(file)) => Some(dir.join(file)),
            _ => None,
        }
    }

    pub fn supports_rules(&self) -> bool {
        self.rules_filename.is_some()
    }
}

/// `~/.claude` → `~/.claude.json`: Claude keeps MCP servers in a sibling file
fn derive_mcp_path_from_override(dir: &Path) -> Option<PathBuf> {
    let file_name = dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())?
        .trim()
        .to_string();
    if file_name.is_empty() {
        return None;
    }
    let parent = dir.parent().unwrap_or_else(|| Path::new(""));
    Some(parent.join(format!("{file_name}.json")))
}

/// Registered tools in registration order
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, ToolMetadata>,
}

impl ToolRegistry {
    pub fn from_tools(tools: Vec<ToolMetadata>) -> Self {
        let mut registry = Self::default();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Builtin clients rooted at the user's home directory
    pub fn builtin(settings: &AppSettings) -> Result<Self, AppError> {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::Config("Unable to determine home directory".to_string()))?;
        Ok(Self::builtin_in(&home, settings))
    }

    /// Builtin clients rooted at `home`; directory overrides from settings win
    pub fn builtin_in(home: &Path, settings: &AppSettings) -> Self {
        let dir_for = |id: &str, default: PathBuf| settings.tool_dir_override(id).unwrap_or(default);

        let claude_dir = dir_for("claude", home.join(".claude"));
        let claude_mcp = match settings.tool_dir_override("claude") {
            Some(custom) => {
                derive_mcp_path_from_override(&custom).unwrap_or_else(|| home.join(".claude.json"))
            }
            None => home.join(".claude.json"),
        };
        let mut claude = ToolMetadata::new("claude", "Claude Code", SyncFormat::Json);
        claude.config_paths = vec![claude_dir.join("settings.json")];
        claude.mcp_config_path = Some(claude_mcp);
        claude.rules_filename = Some("CLAUDE.md".into());
        claude.global_rules_dir = Some(claude_dir.clone());
        claude.project_rules_filename = Some("CLAUDE.md".into());
        claude.project_relative_mcp_filename = Some(".mcp.json".into());
        claude.supports_mcp = true;
        claude.detect_dir = Some(claude_dir);

        let codex_dir = dir_for("codex", home.join(".codex"));
        let mut codex = ToolMetadata::new("codex", "Codex", SyncFormat::Toml);
        codex.config_paths = vec![codex_dir.join("config.toml")];
        codex.rules_filename = Some("AGENTS.md".into());
        codex.global_rules_dir = Some(codex_dir.clone());
        codex.project_rules_filename = Some("AGENTS.md".into());
        codex.supports_mcp = true;
        codex.detect_dir = Some(codex_dir);

        let gemini_dir = dir_for("gemini", home.join(".gemini"));
        let mut gemini = ToolMetadata::new("gemini", "Gemini CLI", SyncFormat::Json);
        gemini.config_paths = vec![gemini_dir.join("settings.json")];
        gemini.rules_filename = Some("GEMINI.md".into());
        gemini.global_rules_dir = Some(gemini_dir.clone());
        gemini.project_rules_filename = Some("GEMINI.md".into());
        gemini.project_relative_mcp_filename = Some(".gemini/settings.json".into());
        gemini.supports_mcp = true;
        gemini.detect_dir = Some(gemini_dir);

        let cursor_dir = dir_for("cursor", home.join(".cursor"));
        let mut cursor = ToolMetadata::new("cursor", "Cursor", SyncFormat::Json);
        cursor.config_paths = vec![cursor_dir.join("mcp.json")];
        cursor.project_relative_mcp_filename = Some(".cursor/mcp.json".into());
        cursor.supports_mcp = true;
        cursor.detect_dir = Some(cursor_dir);

        let windsurf_dir = dir_for("windsurf", home.join(".codeium").join("windsurf"));
        let mut windsurf = ToolMetadata::new("windsurf", "Windsurf", SyncFormat::Json);
        windsurf.rules_filename = Some("global_rules.md".into());
        windsurf.global_rules_dir = Some(windsurf_dir.join("memories"));
        windsurf.project_rules_filename = Some(".windsurfrules".into());
        windsurf.detect_dir = Some(windsurf_dir);

        Self::from_tools(vec![claude, codex, gemini, cursor, windsurf])
    }

    pub fn register(&mut self, tool: ToolMetadata) {
        self.tools.insert(tool.id.clone(), tool);
    }

    pub fn get(&self, id: &str) -> Option<&ToolMetadata> {
        self.tools.get(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &ToolMetadata> {
        self.tools.values()
    }

    pub fn ids(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn is_installed(&self, tool: &ToolMetadata) -> bool {
        tool.detect_dir.as_deref().map_or(true, Path::is_dir)
    }
}
