use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Environment variable that relocates the app data directory.
pub const CONFIG_DIR_ENV: &str = "CLI_SYNC_CONFIG_DIR";

/// App data directory (~/.cli-sync), or `$CLI_SYNC_CONFIG_DIR` when set
pub fn get_app_config_dir() -> Result<PathBuf, AppError> {
    if let Ok(custom) = std::env::var(CONFIG_DIR_ENV) {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Ok(expand_home(trimmed));
        }
    }

    dirs::home_dir()
        .map(|home| home.join(".cli-sync"))
        .ok_or_else(|| AppError::Config("Unable to determine home directory".to_string()))
}

pub fn get_database_path() -> Result<PathBuf, AppError> {
    Ok(get_app_config_dir()?.join("cli-sync.db"))
}

pub fn get_backups_dir() -> Result<PathBuf, AppError> {
    Ok(get_app_config_dir()?.join("backups"))
}

/// Expand a leading `~` against the home directory
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(stripped) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    } else if let Some(stripped) = raw.strip_prefix("~\\") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }

    PathBuf::from(raw)
}

/// Read a text file, `None` when it does not exist
pub fn read_text_file(path: &Path) -> Result<Option<String>, AppError> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| AppError::io(path, e))
}

/// Atomic write for text (TOML/JSON/Markdown)
pub fn write_text_file(path: &Path, data: &str) -> Result<(), AppError> {
    atomic_write(path, data.as_bytes())
}

/// Write to a sibling temp file, then rename over the target so readers never see a half-written file
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    // a bare file name lives in the working directory
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => {
            return Err(AppError::Config(format!(
                "Invalid target path: {}",
                path.display()
            )))
        }
    };
    fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| AppError::IoContext {
        context: format!("Failed to create temp file in {}", parent.display()),
        source: e,
    })?;
    tmp.write_all(data).map_err(|e| AppError::io(tmp.path(), e))?;
    tmp.flush().map_err(|e| AppError::io(tmp.path(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = fs::metadata(path) {
            let perm = meta.permissions().mode();
            let _ = fs::set_permissions(tmp.path(), fs::Permissions::from_mode(perm));
        }
    }

    tmp.persist(path).map_err(|e| AppError::IoContext {
        context: format!("Atomic replace failed: {}", path.display()),
        source: e.error,
    })?;
    Ok(())
}

pub fn copy_file(from: &Path, to: &Path) -> Result<(), AppError> {
    fs::copy(from, to).map_err(|e| AppError::IoContext {
        context: format!("Copy failed ({} -> {})", from.display(), to.display()),
        source: e,
    })?;
    Ok(())
}
