//! Error and Escalation Policy
//!
//! Classifies how a task cycle failed and decides what happens next:
//! silent return to waiting, retry after a cooldown, or escalation back
//! to the task store (closing the task or leaving it open). The policy
//! never executes anything itself; the orchestrator applies the decided
//! action.

pub mod blockers;

use chrono::Utc;
use thiserror::Error;

use crate::models::ExecutorKind;
use crate::services::executors::InvokeError;

/// Tag added to tasks that were escalated and closed out.
pub const ESCALATION_TAG: &str = "taskpilot-escalated";

/// One failed invocation inside an exhausted chain.
#[derive(Debug, Clone)]
pub struct FailedAttempt {
    /// Executor that was tried
    pub executor: ExecutorKind,
    /// Its error message
    pub message: String,
}

impl FailedAttempt {
    pub fn new(executor: ExecutorKind, message: impl Into<String>) -> Self {
        Self {
            executor,
            message: message.into(),
        }
    }

    /// Whether this attempt never got a process off the ground.
    pub fn is_transport(&self) -> bool {
        self.message.contains("could not start")
    }
}

impl std::fmt::Display for FailedAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.executor, self.message)
    }
}

/// Why a whole task cycle failed.
#[derive(Debug, Clone, Error)]
pub enum CycleError {
    /// Every permitted executor was tried and failed
    #[error("all executors failed after {} attempts", attempts.len())]
    AllExecutorsFailed { attempts: Vec<FailedAttempt> },
    /// A pinned route failed and fallback was not permitted
    #[error("strict route to {executor} failed: {message}")]
    StrictRouteFailed {
        executor: ExecutorKind,
        message: String,
    },
    /// The cycle's cancellation token fired
    #[error("cycle cancelled")]
    Cancelled,
    /// No executor process could start at all
    #[error("executor transport failure: {0}")]
    Transport(String),
    /// The task store could not be read
    #[error("task store read failed: {0}")]
    StoreRead(String),
}

impl CycleError {
    /// Build the cycle error for a single strict-route failure.
    ///
    /// Transport failures stay transport failures even on strict routes:
    /// a missing binary is an environment problem, not a task problem.
    pub fn from_strict_failure(executor: ExecutorKind, error: &InvokeError) -> Self {
        match error {
            InvokeError::Cancelled => CycleError::Cancelled,
            InvokeError::Spawn(msg) => CycleError::Transport(msg.clone()),
            other => CycleError::StrictRouteFailed {
                executor,
                message: other.to_string(),
            },
        }
    }

    /// Build the cycle error for an exhausted chain.
    ///
    /// If nothing ever ran (every attempt was a spawn failure) the whole
    /// cycle counts as a transport failure instead of an escalation.
    pub fn from_exhausted_chain(attempts: Vec<FailedAttempt>) -> Self {
        if !attempts.is_empty() && attempts.iter().all(|a| a.is_transport()) {
            let summary = attempts
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            CycleError::Transport(summary)
        } else {
            CycleError::AllExecutorsFailed { attempts }
        }
    }
}

/// Whether a single invocation failure may be retried on another
/// executor. Cancellation never falls back.
pub fn should_fallback(error: &InvokeError) -> bool {
    !error.is_cancelled()
}

/// What the orchestrator does after a failed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureAction {
    /// Log only, return to waiting (cancellation)
    ReturnToWaiting,
    /// Reschedule after the transport cooldown, task untouched
    RetryAfterCooldown,
    /// Append a note, add the escalation tag, close the task out
    EscalateAndClose { note: String },
    /// Append a note but leave the task open for a future pick
    EscalateAndLeaveOpen { note: String },
}

/// Decide the follow-up action for a failed cycle.
pub fn resolve_failure(error: &CycleError) -> FailureAction {
    match error {
        CycleError::Cancelled => FailureAction::ReturnToWaiting,
        CycleError::Transport(_) | CycleError::StoreRead(_) => FailureAction::RetryAfterCooldown,
        CycleError::StrictRouteFailed { executor, message } => FailureAction::EscalateAndClose {
            note: strict_failure_note(*executor, message),
        },
        CycleError::AllExecutorsFailed { attempts } => FailureAction::EscalateAndLeaveOpen {
            note: exhaustion_note(attempts),
        },
    }
}

fn strict_failure_note(executor: ExecutorKind, message: &str) -> String {
    format!(
        "[taskpilot {}] escalated: pinned executor {} failed and fallback is disabled on this route.\n{}",
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
        executor,
        message
    )
}

fn exhaustion_note(attempts: &[FailedAttempt]) -> String {
    let mut note = format!(
        "[taskpilot {}] all executors failed; task left open for a future attempt.",
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
    );
    for attempt in attempts {
        note.push_str("\n- ");
        note.push_str(&attempt.to_string());
    }
    note
}
