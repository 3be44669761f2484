//! In-Memory Task Store
//!
//! `TaskStore` over process memory, preserving insertion order so picks
//! stay FIFO. Used by local mode (no store URL configured) and by the
//! integration tests. Completing an already-completed task is accepted
//! so retried completions stay idempotent.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{Task, TaskPatch};

use super::{StoreError, TaskStore};

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    completed: Vec<String>,
}

/// `TaskStore` that lives entirely in process memory.
#[derive(Clone, Default)]
pub struct MemoryTaskStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the active list.
    pub async fn add(&self, task: Task) {
        self.inner.write().await.tasks.push(task);
    }

    /// Snapshot of one task, if still active.
    pub async fn get(&self, id: &str) -> Option<Task> {
        self.inner
            .read()
            .await
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Ids completed so far, in completion order.
    pub async fn completed_ids(&self) -> Vec<String> {
        self.inner.read().await.completed.clone()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list_active(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.inner.read().await.tasks.clone())
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.apply_patch(&patch);
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn complete(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != id);
        if inner.tasks.len() == before {
            if inner.completed.iter().any(|c| c == id) {
                return Ok(());
            }
            return Err(StoreError::NotFound(id.to_string()));
        }
        inner.completed.push(id.to_string());
        Ok(())
    }
}
