//! Cross-Platform Path Utilities
//!
//! Functions for resolving the taskpilot home directory and the files
//! that live under it (config, briefs, journal).

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the taskpilot directory (~/.taskpilot/)
pub fn taskpilot_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".taskpilot"))
}

/// Get the config file path (~/.taskpilot/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(taskpilot_dir()?.join("config.json"))
}

/// Get the project briefs directory (~/.taskpilot/briefs/)
pub fn briefs_dir() -> AppResult<PathBuf> {
    Ok(taskpilot_dir()?.join("briefs"))
}

/// Get the completion journal path (~/.taskpilot/journal.jsonl)
pub fn journal_path() -> AppResult<PathBuf> {
    Ok(taskpilot_dir()?.join("journal.jsonl"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the taskpilot directory, creating if it doesn't exist
pub fn ensure_taskpilot_dir() -> AppResult<PathBuf> {
    let path = taskpilot_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
