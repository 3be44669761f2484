//! Executor Invocation Contract
//!
//! Defines the uniform interface every coding executor implements: one
//! `invoke` call is one external round trip with its own timeout and
//! cancellation token, streaming incremental output over a channel.
//! Strategies compose these invocations; they never talk to a process
//! directly.

pub mod catalog;
pub mod cli;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::models::{ExecutionResult, ExecutorKind};

/// One executor invocation request.
#[derive(Debug, Clone)]
pub struct InvokeRequest {
    /// The task prompt
    pub prompt: String,
    /// Optional system prompt prepended to the conversation
    pub system_prompt: Option<String>,
    /// Model override; executors use their default when unset
    pub model: Option<String>,
    /// Hard wall-clock limit for this invocation
    pub timeout: Duration,
}

impl InvokeRequest {
    /// Create a request with the given prompt and timeout.
    pub fn new(prompt: impl Into<String>, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            model: None,
            timeout,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// Set a model override.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Why a single invocation failed.
///
/// `Cancelled` is distinguished from every other variant so a cancelled
/// invocation is never mistaken for a blocking signal or a real failure.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// The executor process could not start at all
    #[error("executor could not start: {0}")]
    Spawn(String),
    /// The invocation exceeded its wall-clock limit
    #[error("executor timed out after {0:?}")]
    Timeout(Duration),
    /// The cycle's cancellation token fired
    #[error("invocation cancelled")]
    Cancelled,
    /// A blocking runtime signal was detected in the output
    #[error("blocking runtime signal: {0}")]
    Blocked(String),
    /// The executor ran but failed (non-zero exit, error output)
    #[error("executor failed: {0}")]
    Failed(String),
}

impl InvokeError {
    /// Whether this failure came from cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, InvokeError::Cancelled)
    }

    /// Whether this failure is a transport problem (process never ran).
    pub fn is_transport(&self) -> bool {
        matches!(self, InvokeError::Spawn(_))
    }
}

/// Uniform contract implemented once per executor family.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Which family this executor belongs to.
    fn kind(&self) -> ExecutorKind;

    /// Run one prompt to completion.
    ///
    /// Incremental output lines are forwarded over `chunk_tx` as they
    /// arrive; the receiver may drop at any time without affecting the
    /// invocation. Cancelling `cancel` must abort the invocation and
    /// surface `InvokeError::Cancelled`, never a timeout.
    async fn invoke(
        &self,
        request: InvokeRequest,
        chunk_tx: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult, InvokeError>;
}

/// The full set of configured executors, one per family.
#[derive(Clone)]
pub struct ExecutorSet {
    executors: HashMap<ExecutorKind, Arc<dyn Executor>>,
}

impl ExecutorSet {
    /// Build a set from one executor per family.
    ///
    /// Each executor is stored under its own `kind()`; passing two
    /// executors of the same family keeps only the last one.
    pub fn new(executors: Vec<Arc<dyn Executor>>) -> Self {
        let executors = executors.into_iter().map(|e| (e.kind(), e)).collect();
        Self { executors }
    }

    /// Executor for one family.
    pub fn get(&self, kind: ExecutorKind) -> Option<Arc<dyn Executor>> {
        self.executors.get(&kind).cloned()
    }

    /// Number of configured families.
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// Whether no executor is configured.
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

impl std::fmt::Debug for ExecutorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<&str> = self.executors.keys().map(|k| k.id()).collect();
        f.debug_struct("ExecutorSet").field("kinds", &kinds).finish()
    }
}
