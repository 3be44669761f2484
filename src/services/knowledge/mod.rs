//! Knowledge Context
//!
//! Optional context sources consulted while building a task's prompts.
//! Lookups are strictly best-effort: a failing provider is logged and
//! skipped, and aggregation clips each block so one verbose source
//! cannot crowd out the task itself.

pub mod brief;
pub mod journal;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::warn;

use crate::models::Task;
use crate::utils::error::AppResult;
use crate::utils::text::clip_chars;

pub use brief::ProjectBriefProvider;
pub use journal::{CompletionJournal, JournalEntry};

/// Character budget for one aggregated context block.
pub const CONTEXT_BLOCK_CHARS: usize = 4000;

/// One optional source of extra context for a task.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Look up context for a task; `None` when the source has nothing.
    async fn lookup(&self, task: &Task) -> AppResult<Option<String>>;
}

/// Query every provider concurrently and collect the usable blocks.
///
/// Provider order is preserved in the output. Failures are logged and
/// skipped; a cycle never fails on missing context.
pub async fn gather_context(providers: &[Arc<dyn ContextProvider>], task: &Task) -> Vec<String> {
    let lookups = providers.iter().map(|provider| {
        let provider = provider.clone();
        async move {
            let name = provider.name().to_string();
            (name, provider.lookup(task).await)
        }
    });

    let mut blocks = Vec::new();
    for (name, result) in join_all(lookups).await {
        match result {
            Ok(Some(block)) if !block.trim().is_empty() => {
                blocks.push(clip_chars(block.trim(), CONTEXT_BLOCK_CHARS));
            }
            Ok(_) => {}
            Err(err) => warn!(provider = %name, error = %err, "context lookup failed, skipping"),
        }
    }
    blocks
}
