//! Orchestrator Events
//!
//! Fire-and-forget event surface for anything that wants to watch the
//! daemon work: status snapshots on every state transition, incremental
//! executor output, route switches, completions and escalations.
//! Emitting an event never blocks the orchestrator and never fails it.

pub mod bus;

use serde::{Deserialize, Serialize};

use crate::models::{ExecutorKind, ExecutorRunState, OrchestratorState, Task};

pub use bus::EventBus;

/// Compact task reference carried in snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: String,
    pub title: String,
}

impl From<&Task> for TaskRef {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
        }
    }
}

/// Run state of each executor family within the current cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorStates {
    pub claude: ExecutorRunState,
    pub codex: ExecutorRunState,
    pub gemini: ExecutorRunState,
}

impl ExecutorStates {
    pub fn get(&self, kind: ExecutorKind) -> ExecutorRunState {
        match kind {
            ExecutorKind::Claude => self.claude,
            ExecutorKind::Codex => self.codex,
            ExecutorKind::Gemini => self.gemini,
        }
    }

    pub fn set(&mut self, kind: ExecutorKind, state: ExecutorRunState) {
        match kind {
            ExecutorKind::Claude => self.claude = state,
            ExecutorKind::Codex => self.codex = state,
            ExecutorKind::Gemini => self.gemini = state,
        }
    }
}

/// Full picture of the orchestrator at one instant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Where the state machine currently is
    pub state: OrchestratorState,
    /// Task being worked, if any
    pub current_task: Option<TaskRef>,
    /// Executor currently holding the route, if any
    pub current_executor: Option<ExecutorKind>,
    /// Per-family run states for the current cycle
    pub executors: ExecutorStates,
    /// Head of the runnable queue as of the last pick
    pub queue_preview: Vec<TaskRef>,
    /// Tasks completed since the daemon started
    pub completed_count: u64,
}

/// Events published while the orchestrator runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    /// The state machine moved; full snapshot attached
    StateChanged { snapshot: StatusSnapshot },
    /// Incremental executor output
    ExecutorLog {
        task_id: String,
        executor: ExecutorKind,
        chunk: String,
    },
    /// The active route switched executors mid-cycle
    RouteSwitched {
        task_id: String,
        executor: ExecutorKind,
        reason: String,
    },
    /// A task finished and was completed against the store
    TaskCompleted {
        task_id: String,
        executor: ExecutorKind,
    },
    /// A task was escalated to a human
    TaskEscalated {
        task_id: String,
        note: String,
        closed: bool,
    },
    /// A cycle ended in an error that was not an escalation
    CycleFailed { task_id: String, error: String },
}

/// Fire-and-forget event consumer.
pub trait EventSink: Send + Sync {
    /// Deliver one event; must never block the caller.
    fn emit(&self, event: OrchestratorEvent);
}

/// Sink that discards everything; used by tests and one-shot runs.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: OrchestratorEvent) {}
}
