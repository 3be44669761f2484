//! Completion Journal
//!
//! Append-only JSONL record of completed cycles, one line per task,
//! written fire-and-forget after each completion. Doubles as a context
//! source: tasks with a project see what was recently finished there.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::{ExecutorKind, Task};
use crate::utils::error::AppResult;
use crate::utils::paths;

use super::ContextProvider;

/// How many journal entries a context lookup surfaces at most.
const RECENT_LIMIT: usize = 5;

/// How far back a lookup scans before filtering by project.
const SCAN_LIMIT: usize = 50;

/// One completed cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub task_id: String,
    pub title: String,
    pub project: Option<String>,
    pub executor: ExecutorKind,
    pub skill: String,
    pub completed_at: DateTime<Utc>,
}

/// Append-only journal at a fixed path.
pub struct CompletionJournal {
    path: PathBuf,
}

impl CompletionJournal {
    /// Journal at the default location.
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            path: paths::journal_path()?,
        })
    }

    /// Journal at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one entry, creating the file and its directory on first write.
    pub async fn append(&self, entry: &JournalEntry) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Most recent entries, newest first. Malformed lines are skipped.
    pub async fn recent(&self, limit: usize) -> AppResult<Vec<JournalEntry>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut entries: Vec<JournalEntry> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!(error = %err, "skipping malformed journal line");
                    None
                }
            })
            .collect();
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}

#[async_trait]
impl ContextProvider for CompletionJournal {
    fn name(&self) -> &str {
        "completion-journal"
    }

    async fn lookup(&self, task: &Task) -> AppResult<Option<String>> {
        let Some(ref project) = task.project else {
            return Ok(None);
        };

        let entries = self.recent(SCAN_LIMIT).await?;
        let matching: Vec<&JournalEntry> = entries
            .iter()
            .filter(|e| e.project.as_deref() == Some(project.as_str()))
            .take(RECENT_LIMIT)
            .collect();
        if matching.is_empty() {
            return Ok(None);
        }

        let mut block = format!("## Recently Completed in {}\n", project);
        for entry in matching {
            block.push_str(&format!(
                "- {} ({} via {})\n",
                entry.title,
                entry.completed_at.format("%Y-%m-%d"),
                entry.executor
            ));
        }
        Ok(Some(block))
    }
}
