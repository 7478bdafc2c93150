use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Skipped,
    Unsupported,
    Error,
}

/// Outcome of one tool inside a fleet sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub tool_id: String,
    pub status: SyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_server_names: Option<Vec<String>>,
}

impl SyncResult {
    fn new(tool_id: &str, status: SyncStatus, message: Option<String>) -> Self {
        Self {
            tool_id: tool_id.to_string(),
            status,
            message,
            target_path: None,
            applied_server_names: None,
        }
    }

    pub fn success(tool_id: &str, target: &Path) -> Self {
        let mut result = Self::new(tool_id, SyncStatus::Success, None);
        result.target_path = Some(target.display().to_string());
        result
    }

    pub fn skipped(tool_id: &str, reason: impl Into<String>) -> Self {
        Self::new(tool_id, SyncStatus::Skipped, Some(reason.into()))
    }

    pub fn unsupported(tool_id: &str, reason: impl Into<String>) -> Self {
        Self::new(tool_id, SyncStatus::Unsupported, Some(reason.into()))
    }

    pub fn error(tool_id: &str, message: impl Into<String>) -> Self {
        Self::new(tool_id, SyncStatus::Error, Some(message.into()))
    }

    pub fn with_applied(mut self, names: Vec<String>) -> Self {
        self.applied_server_names = Some(names);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Per-tool sync preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    pub tool_id: String,
    pub enabled: bool,
    /// `None` syncs every server of the source set
    #[serde(default)]
    pub servers: Option<Vec<String>>,
    #[serde(default)]
    pub target_path: Option<String>,
    pub global: bool,
    #[serde(default)]
    pub rules_source_id: Option<String>,
}

impl SyncConfig {
    pub fn defaults_for(tool_id: &str) -> Self {
        Self {
            tool_id: tool_id.to_string(),
            enabled: true,
            servers: None,
            target_path: None,
            global: true,
            rules_source_id: None,
        }
    }
}

/// Checksum recorded after the last successful write to a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStateRecord {
    pub path: String,
    pub last_sync_hash: String,
    pub synced_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Mcp,
    Rules,
}

impl SyncKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncKind::Mcp => "mcp",
            SyncKind::Rules => "rules",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcp" => Ok(SyncKind::Mcp),
            "rules" => Ok(SyncKind::Rules),
            other => Err(AppError::validation(format!("unknown sync kind '{other}'"))),
        }
    }
}

/// One immutable audit record per fleet run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncHistoryEntry {
    pub id: i64,
    pub kind: SyncKind,
    pub source_id: Option<String>,
    pub strategy: String,
    pub success_count: i64,
    pub skipped_count: i64,
    pub unsupported_count: i64,
    pub error_count: i64,
    pub results: Vec<SyncResult>,
    pub created_at: i64,
}

impl SyncHistoryEntry {
    /// Summarize a result list; `id` is assigned by the store
    pub fn summarize(
        kind: SyncKind,
        source_id: Option<&str>,
        strategy: &str,
        results: &[SyncResult],
        created_at: i64,
    ) -> Self {
        let count = |status: SyncStatus| {
            results.iter().filter(|r| r.status == status).count() as i64
        };
        Self {
            id: 0,
            kind,
            source_id: source_id.map(str::to_string),
            strategy: strategy.to_string(),
            success_count: count(SyncStatus::Success),
            skipped_count: count(SyncStatus::Skipped),
            unsupported_count: count(SyncStatus::Unsupported),
            error_count: count(SyncStatus::Error),
            results: results.to_vec(),
            created_at,
        }
    }
}

/// Relation between a file on disk and its last recorded sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftStatus {
    /// Never synced
    Untracked,
    /// Synced once, file no longer exists
    Missing,
    Clean,
    Drifted,
}
