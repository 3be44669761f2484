//! Project Brief Provider
//!
//! Serves a hand-maintained per-project brief from
//! `~/.taskpilot/briefs/{project}.md`. Tasks without a project, and
//! projects without a brief file, simply contribute nothing.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::models::Task;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths;

use super::ContextProvider;

/// `ContextProvider` over a directory of markdown brief files.
pub struct ProjectBriefProvider {
    briefs_dir: PathBuf,
}

impl ProjectBriefProvider {
    /// Provider over the default briefs directory.
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            briefs_dir: paths::briefs_dir()?,
        })
    }

    /// Provider over an explicit directory.
    pub fn with_dir(briefs_dir: impl Into<PathBuf>) -> Self {
        Self {
            briefs_dir: briefs_dir.into(),
        }
    }
}

/// File stem for a project name: lowercased, anything outside
/// `[a-z0-9-_]` collapsed to `-`. Keeps arbitrary project labels from
/// escaping the briefs directory.
fn sanitize_file_stem(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[async_trait]
impl ContextProvider for ProjectBriefProvider {
    fn name(&self) -> &str {
        "project-brief"
    }

    async fn lookup(&self, task: &Task) -> AppResult<Option<String>> {
        let Some(ref project) = task.project else {
            return Ok(None);
        };

        let file = self
            .briefs_dir
            .join(format!("{}.md", sanitize_file_stem(project)));
        match tokio::fs::read_to_string(&file).await {
            Ok(content) => Ok(Some(format!(
                "## Project Brief: {}\n{}",
                project,
                content.trim()
            ))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AppError::knowledge(format!(
                "reading {}: {}",
                file.display(),
                err
            ))),
        }
    }
}
