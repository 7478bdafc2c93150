//! Target path resolution for rules and MCP syncs.

use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::tool_registry::ToolRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Rules,
    Mcp,
}

impl TargetKind {
    fn label(&self) -> &'static str {
        match self {
            TargetKind::Rules => "rules",
            TargetKind::Mcp => "MCP",
        }
    }
}

/// Everything the resolver needs to pick one file for one tool
#[derive(Debug, Clone)]
pub struct TargetSpec {
    pub tool_id: String,
    pub kind: TargetKind,
    /// `None` means global
    pub global: Option<bool>,
    pub override_path: Option<PathBuf>,
    pub project_root: Option<PathBuf>,
}

impl TargetSpec {
    pub fn new(tool_id: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            tool_id: tool_id.into(),
            kind,
            global: None,
            override_path: None,
            project_root: None,
        }
    }

    pub fn global(mut self, global: bool) -> Self {
        self.global = Some(global);
        self
    }

    pub fn override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }
}

/// Where a single-tool sync writes, as chosen by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTarget {
    /// Explicit file, used as-is
    Path(PathBuf),
    /// The tool's declared global location
    Global,
    /// `root` joined with the tool's project-relative filename
    Project(PathBuf),
}

impl SyncTarget {
    pub fn to_spec(&self, tool_id: &str, kind: TargetKind) -> TargetSpec {
        let spec = TargetSpec::new(tool_id, kind);
        match self {
            SyncTarget::Path(path) => spec.override_path(path.clone()),
            SyncTarget::Global => spec.global(true),
            SyncTarget::Project(root) => spec.global(false).project_root(root.clone()),
        }
    }
}

/// Resolve the file a sync should write.
///
/// An explicit override always wins. Otherwise the tool must be registered and
/// must declare a location for the requested kind and scope.
pub fn resolve_target_path(registry: &ToolRegistry, spec: &TargetSpec) -> Result<PathBuf, AppError> {
    if let Some(path) = &spec.override_path {
        return Ok(path.clone());
    }

    let tool = registry
        .get(&spec.tool_id)
        .ok_or_else(|| AppError::not_found(format!("Tool '{}'", spec.tool_id)))?;

    if spec.global.unwrap_or(true) {
        let path = match spec.kind {
            TargetKind::Mcp => tool.global_mcp_path(),
            TargetKind::Rules => tool.global_rules_path(),
        };
        return path.ok_or_else(|| {
            AppError::validation(format!(
                "Tool '{}' declares no global {} location",
                tool.id,
                spec.kind.label()
            ))
        });
    }

    let root = spec
        .project_root
        .as_deref()
        .filter(|root| !root.as_os_str().is_empty())
        .ok_or_else(|| AppError::validation("project root is required for project-scoped target"))?;
    if !root.exists() {
        return Err(AppError::validation(format!(
            "project root does not exist: {}",
            root.display()
        )));
    }

    let filename = match spec.kind {
        TargetKind::Mcp => tool.project_relative_mcp_filename.as_deref(),
        TargetKind::Rules => tool.project_rules_filename.as_deref(),
    };
    let filename = filename.ok_or_else(|| {
        AppError::validation(format!(
            "tool does not support project-scoped target: '{}' ({})",
            tool.id,
            spec.kind.label()
        ))
    })?;

    Ok(join_relative(root, filename))
}

fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}
