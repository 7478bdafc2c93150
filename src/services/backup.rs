//! Snapshots of target files taken right before a sync overwrites them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{atomic_write, copy_file};
use crate::error::AppError;

const METADATA_FILE: &str = "snapshot.toml";

/// Handle to a stored snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRef {
    pub id: String,
    pub label: String,
    /// File the snapshot was taken of (restore target)
    pub source: PathBuf,
    /// Copy inside the snapshot directory
    pub stored: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// Collaborator the sync services call before every target write.
/// Callers treat failures as non-fatal.
pub trait SnapshotBackup: Send + Sync {
    fn create_snapshot(&self, label: &str, target: &Path) -> Result<SnapshotRef, AppError>;

    fn restore(&self, snapshot: &SnapshotRef) -> Result<(), AppError>;
}

/// Backups disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBackup;

impl SnapshotBackup for NoopBackup {
    fn create_snapshot(&self, label: &str, target: &Path) -> Result<SnapshotRef, AppError> {
        Ok(SnapshotRef {
            id: String::new(),
            label: label.to_string(),
            source: target.to_path_buf(),
            stored: target.to_path_buf(),
            created_at: Utc::now(),
        })
    }

    fn restore(&self, _snapshot: &SnapshotRef) -> Result<(), AppError> {
        Ok(())
    }
}

/// Plain file copies under one backup root, one directory per snapshot
#[derive(Debug, Clone)]
pub struct FileSnapshotBackup {
    root: PathBuf,
    retain: usize,
}

impl FileSnapshotBackup {
    pub fn new(root: impl Into<PathBuf>, retain: usize) -> Self {
        Self {
            root: root.into(),
            retain: retain.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stored snapshots, newest first. Directories without readable metadata are ignored.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotRef>, AppError> {
        let mut snapshots = Vec::new();
        for dir in self.snapshot_dirs()? {
            let meta_path = dir.join(METADATA_FILE);
            let content = match fs::read_to_string(&meta_path) {
                Ok(content) => content,
                Err(_) => continue,
            };
            match toml::from_str::<SnapshotRef>(&content) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => log::warn!("Skipping unreadable snapshot {}: {e}", meta_path.display()),
            }
        }
        snapshots.reverse();
        Ok(snapshots)
    }

    /// Snapshot directories sorted oldest first (names start with a sortable timestamp)
    fn snapshot_dirs(&self) -> Result<Vec<PathBuf>, AppError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root).map_err(|e| AppError::io(&self.root, e))?;
        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AppError::io(&self.root, e))?;
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn prune(&self) -> Result<(), AppError> {
        let dirs = self.snapshot_dirs()?;
        if dirs.len() <= self.retain {
            return Ok(());
        }
        let excess = dirs.len() - self.retain;
        for dir in dirs.into_iter().take(excess) {
            if let Err(e) = fs::remove_dir_all(&dir) {
                log::warn!("Failed to prune snapshot {}: {e}", dir.display());
            } else {
                log::debug!("Pruned snapshot {}", dir.display());
            }
        }
        Ok(())
    }
}

fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('-');
    if trimmed.is_empty() {
        "snapshot".to_string()
    } else {
        trimmed.chars().take(48).collect()
    }
}

impl SnapshotBackup for FileSnapshotBackup {
    fn create_snapshot(&self, label: &str, target: &Path) -> Result<SnapshotRef, AppError> {
        if !target.is_file() {
            return Err(AppError::not_found(format!(
                "Nothing to snapshot at {}",
                target.display()
            )));
        }

        let created_at = Utc::now();
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        let id = format!(
            "{}_{}_{}",
            created_at.format("%Y%m%dT%H%M%S%3f"),
            sanitize_label(label),
            &uuid[..8]
        );
        let dir = self.root.join(&id);
        fs::create_dir_all(&dir).map_err(|e| AppError::io(&dir, e))?;

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "target".to_string());
        let stored = dir.join(file_name);
        copy_file(target, &stored)?;

        let snapshot = SnapshotRef {
            id,
            label: label.to_string(),
            source: target.to_path_buf(),
            stored,
            created_at,
        };
        let metadata = toml::to_string_pretty(&snapshot)
            .map_err(|e| AppError::Config(format!("Failed to serialize snapshot metadata: {e}")))?;
        let meta_path = dir.join(METADATA_FILE);
        fs::write(&meta_path, metadata).map_err(|e| AppError::io(&meta_path, e))?;

        log::info!(
            "Snapshot {} taken of {}",
            snapshot.id,
            snapshot.source.display()
        );
        self.prune()?;
        Ok(snapshot)
    }

    fn restore(&self, snapshot: &SnapshotRef) -> Result<(), AppError> {
        let data = fs::read(&snapshot.stored).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                AppError::not_found(format!("Snapshot '{}'", snapshot.id))
            }
            _ => AppError::io(&snapshot.stored, e),
        })?;
        atomic_write(&snapshot.source, &data)?;
        log::info!(
            "Restored {} from snapshot {}",
            snapshot.source.display(),
            snapshot.id
        );
        Ok(())
    }
}
