//! Fallback Chain
//!
//! The default execution strategy: run the routed executor, and when a
//! non-strict attempt fails, walk the family's fixed alternate order
//! until one succeeds or the chain is exhausted. Strict routes get a
//! chain of one. Every attempt is recorded with timing so escalation
//! notes and status events can show exactly what was tried.

use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::models::{ExecutionResult, ExecutorKind, RouteDecision};
use crate::services::executors::{catalog, InvokeError};
use crate::services::policy::{self, CycleError, FailedAttempt};
use crate::services::prompt::PromptSet;

use super::{Invoker, StrategyOutcome};

// ============================================================================
// Attempt log
// ============================================================================

/// One executor invocation inside a strategy, with timing.
#[derive(Debug, Clone)]
pub struct ExecutionAttempt {
    /// Executor that ran
    pub executor: ExecutorKind,
    /// Role within the strategy ("primary", "fallback", "shadow", ...)
    pub role: String,
    /// Failure message; `None` when the attempt succeeded
    pub error: Option<String>,
    /// Wall-clock duration of the attempt
    pub duration_ms: u64,
    /// When the attempt started
    pub started_at: DateTime<Utc>,
}

impl ExecutionAttempt {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Ordered record of every invocation a strategy made during one cycle.
#[derive(Debug, Clone, Default)]
pub struct AttemptLog {
    attempts: Vec<ExecutionAttempt>,
}

impl AttemptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attempt: ExecutionAttempt) {
        self.attempts.push(attempt);
    }

    /// Append another log's attempts after this one's.
    pub fn merge(&mut self, other: AttemptLog) {
        self.attempts.extend(other.attempts);
    }

    pub fn attempts(&self) -> &[ExecutionAttempt] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Last recorded failure message, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.attempts
            .iter()
            .rev()
            .find_map(|a| a.error.as_deref())
    }

    /// The failed attempts, in the shape escalation notes consume.
    pub fn failed(&self) -> Vec<FailedAttempt> {
        self.attempts
            .iter()
            .filter_map(|a| {
                a.error
                    .as_ref()
                    .map(|e| FailedAttempt::new(a.executor, e.clone()))
            })
            .collect()
    }

    /// One-line human summary of the whole chain.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| match &a.error {
                Some(err) => format!(
                    "{} ({}) failed after {}ms: {}",
                    a.executor, a.role, a.duration_ms, err
                ),
                None => format!("{} ({}) succeeded after {}ms", a.executor, a.role, a.duration_ms),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Invoke one executor and record the attempt in the log.
pub(super) async fn timed_invoke(
    invoker: &Invoker,
    kind: ExecutorKind,
    role: &str,
    prompt: &str,
    system: Option<&str>,
    log: &mut AttemptLog,
) -> Result<ExecutionResult, InvokeError> {
    let started_at = Utc::now();
    let clock = Instant::now();
    let outcome = invoker.invoke(kind, prompt, system).await;
    log.push(ExecutionAttempt {
        executor: kind,
        role: role.to_string(),
        error: outcome.as_ref().err().map(|e| e.to_string()),
        duration_ms: clock.elapsed().as_millis() as u64,
        started_at,
    });
    outcome
}

// ============================================================================
// Chain execution
// ============================================================================

/// Run the routed executor, falling back through its family order.
///
/// Strict routes never fall back: the first failure is final. A
/// cancelled attempt stops the chain immediately regardless of
/// strictness. An exhausted chain aggregates every failure.
pub async fn run_fallback_chain(
    invoker: &Invoker,
    decision: &RouteDecision,
    prompts: &PromptSet,
) -> Result<StrategyOutcome, CycleError> {
    let mut order = vec![decision.executor];
    if !decision.strict {
        order.extend(catalog::fallback_order(decision.executor));
    }

    let mut log = AttemptLog::new();

    for (index, kind) in order.iter().copied().enumerate() {
        let role = if index == 0 { "primary" } else { "fallback" };
        if index > 0 {
            let cause = log.last_error().unwrap_or("previous attempt failed");
            let reason = format!("falling back after {}: {}", order[index - 1], cause);
            invoker.observer().route_switched(kind, &reason).await;
            info!(from = %order[index - 1], to = %kind, "switching to fallback executor");
        }

        match timed_invoke(invoker, kind, role, &prompts.execution, Some(&prompts.system), &mut log)
            .await
        {
            Ok(result) => {
                if index > 0 {
                    info!(executor = %kind, attempts = log.len(), "fallback chain recovered");
                }
                return Ok(StrategyOutcome::from_result(result, log));
            }
            Err(err) if !policy::should_fallback(&err) => {
                return Err(CycleError::Cancelled);
            }
            Err(err) if decision.strict => {
                warn!(executor = %kind, error = %err, "strict route failed");
                return Err(CycleError::from_strict_failure(decision.executor, &err));
            }
            Err(err) => {
                warn!(executor = %kind, error = %err, "attempt failed, considering fallback");
            }
        }
    }

    warn!(summary = %log.summary(), "fallback chain exhausted");
    Err(CycleError::from_exhausted_chain(log.failed()))
}
