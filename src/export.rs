use directories::UserDirs;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::Note;

pub const BACKUP_FILE_NAME: &str = "notes_backup.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize notes: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("Failed to write {path}: {reason}")]
    WriteError { path: String, reason: String },
}

/// Where a backup goes when no path is given: the configured directory,
/// else the user's download folder, else the working directory.
pub fn default_backup_path(export_dir: Option<&str>) -> PathBuf {
    let dir = export_dir
        .map(crate::utils::expand_path)
        .or_else(|| UserDirs::new().and_then(|d| d.download_dir().map(Path::to_path_buf)))
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join(BACKUP_FILE_NAME)
}

/// Write the full collection as pretty-printed JSON.
pub fn write_backup(notes: &[Note], path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(notes)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ExportError::WriteError {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }
    }

    fs::write(path, json).map_err(|e| ExportError::WriteError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    info!("event=export module=export status=ok count={} path={}", notes.len(), path.display());
    Ok(())
}
