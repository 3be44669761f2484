//! Task Store
//!
//! The external system of record for tasks. The orchestrator polls it
//! for active work and writes back exactly two kinds of mutation: a
//! partial patch (notes, tags) and a completion. Everything else about
//! task lifecycle belongs to the store, not to this process.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Task, TaskPatch};

pub use memory::MemoryTaskStore;
pub use rest::RestTaskStore;

/// Why a store call failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never completed (connect, timeout, DNS)
    #[error("store request failed: {0}")]
    Network(String),
    /// The store answered with a non-success status
    #[error("store returned {status}: {body}")]
    Http { status: u16, body: String },
    /// The response body could not be parsed
    #[error("store response malformed: {0}")]
    InvalidResponse(String),
    /// The task id is unknown to the store
    #[error("no such task: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Network(err.to_string())
    }
}

/// The system of record the orchestrator polls and writes back to.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks currently eligible for processing, in store order.
    async fn list_active(&self) -> Result<Vec<Task>, StoreError>;

    /// Apply a partial update to one task.
    async fn update(&self, id: &str, patch: TaskPatch) -> Result<(), StoreError>;

    /// Mark one task completed, removing it from the active list.
    async fn complete(&self, id: &str) -> Result<(), StoreError>;
}
