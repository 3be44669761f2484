//! Status Board
//!
//! Single writer for the orchestrator's observable state. Every mutation
//! that changes the visible snapshot publishes a `StateChanged` event, so
//! subscribers can mirror the daemon without polling. The board also owns
//! the skip set used to log unrecognized-section tasks once per signature.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{ExecutorKind, ExecutorRunState, OrchestratorState, Task};
use crate::services::events::{EventSink, OrchestratorEvent, StatusSnapshot, TaskRef};

#[derive(Default)]
struct BoardInner {
    snapshot: StatusSnapshot,
    skip_logged: HashSet<String>,
}

/// Shared, observable orchestrator state.
pub(super) struct StatusBoard {
    sink: Arc<dyn EventSink>,
    inner: RwLock<BoardInner>,
}

impl StatusBoard {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            inner: RwLock::new(BoardInner::default()),
        }
    }

    /// Current snapshot.
    pub async fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().await.snapshot.clone()
    }

    /// Current state machine position.
    pub async fn state(&self) -> OrchestratorState {
        self.inner.read().await.snapshot.state
    }

    /// Move the state machine and publish the new snapshot.
    pub async fn transition(&self, state: OrchestratorState) {
        let snapshot = {
            let mut inner = self.inner.write().await;
            inner.snapshot.state = state;
            inner.snapshot.clone()
        };
        self.sink
            .emit(OrchestratorEvent::StateChanged { snapshot });
    }

    /// Enter Working for one task: fresh executor states, no route yet.
    pub async fn begin_cycle(&self, task: &Task) {
        let snapshot = {
            let mut inner = self.inner.write().await;
            inner.snapshot.state = OrchestratorState::Working;
            inner.snapshot.current_task = Some(TaskRef::from(task));
            inner.snapshot.current_executor = None;
            inner.snapshot.executors = Default::default();
            inner.snapshot.clone()
        };
        self.sink
            .emit(OrchestratorEvent::StateChanged { snapshot });
    }

    /// Clear the current cycle; the follow-up `transition` publishes.
    pub async fn finish_cycle(&self, completed: bool) {
        let mut inner = self.inner.write().await;
        if completed {
            inner.snapshot.completed_count += 1;
        }
        inner.snapshot.current_task = None;
        inner.snapshot.current_executor = None;
    }

    /// The route moved to another executor.
    pub async fn set_current_executor(&self, kind: ExecutorKind) {
        let snapshot = {
            let mut inner = self.inner.write().await;
            inner.snapshot.current_executor = Some(kind);
            inner.snapshot.clone()
        };
        self.sink
            .emit(OrchestratorEvent::StateChanged { snapshot });
    }

    /// One executor family changed run state within the cycle.
    pub async fn set_executor_state(&self, kind: ExecutorKind, state: ExecutorRunState) {
        let snapshot = {
            let mut inner = self.inner.write().await;
            inner.snapshot.executors.set(kind, state);
            inner.snapshot.clone()
        };
        self.sink
            .emit(OrchestratorEvent::StateChanged { snapshot });
    }

    /// Head of the runnable queue as of the last pick.
    pub async fn set_queue_preview(&self, preview: Vec<TaskRef>) {
        let snapshot = {
            let mut inner = self.inner.write().await;
            inner.snapshot.queue_preview = preview;
            inner.snapshot.clone()
        };
        self.sink
            .emit(OrchestratorEvent::StateChanged { snapshot });
    }

    /// Whether this skip signature is new. Each signature reports true
    /// exactly once for the life of the daemon.
    pub async fn first_skip(&self, signature: &str) -> bool {
        let mut inner = self.inner.write().await;
        inner.skip_logged.insert(signature.to_string())
    }
}
