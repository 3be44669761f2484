//! Failure Policy Integration Tests
//!
//! What the loop writes back to the store when a cycle fails: exhausted
//! chains annotate and leave the task open, strict failures tag and close
//! it, and cancellation leaves no trace at all.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use taskpilot::models::{ExecutorKind, OrchestratorState, Task, TaskPatch};
use taskpilot::services::events::OrchestratorEvent;
use taskpilot::services::policy::ESCALATION_TAG;
use taskpilot::services::task_store::{MemoryTaskStore, StoreError, TaskStore};
use taskpilot::services::Orchestrator;

use crate::support::{fast_config, rig, wait_for_state, Bench, CollectingSink, Step};

/// Store wrapper that records every patch written back.
#[derive(Clone)]
struct RecordingStore {
    inner: MemoryTaskStore,
    patches: Arc<Mutex<Vec<(String, TaskPatch)>>>,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: MemoryTaskStore::new(),
            patches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn patches(&self) -> Vec<(String, TaskPatch)> {
        self.patches.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskStore for RecordingStore {
    async fn list_active(&self) -> Result<Vec<Task>, StoreError> {
        self.inner.list_active().await
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<(), StoreError> {
        self.patches
            .lock()
            .unwrap()
            .push((id.to_string(), patch.clone()));
        self.inner.update(id, patch).await
    }

    async fn complete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.complete(id).await
    }
}

#[tokio::test]
async fn test_exhausted_chain_leaves_the_task_open() {
    let rig = rig();
    rig.store.add(Task::new("t1", "Water the office plants")).await;
    rig.bench
        .script(ExecutorKind::Claude, vec![Step::Fail("exit status 1".into())])
        .await;
    rig.bench
        .script(ExecutorKind::Codex, vec![Step::Fail("exit status 2".into())])
        .await;
    rig.bench
        .script(ExecutorKind::Gemini, vec![Step::Fail("exit status 3".into())])
        .await;

    rig.orchestrator.run_once().await;

    // Still active, annotated with every attempt, not completed
    assert!(rig.store.completed_ids().await.is_empty());
    let task = rig.store.get("t1").await.unwrap();
    assert!(task.notes.contains("all executors failed"));
    assert!(task.notes.contains("exit status 3"));
    assert!(rig.sink.events().iter().any(|event| matches!(
        event,
        OrchestratorEvent::TaskEscalated { closed: false, .. }
    )));
    for kind in ExecutorKind::ALL {
        assert_eq!(rig.bench.calls(kind).await.len(), 1);
    }
}

#[tokio::test]
async fn test_escalation_patch_carries_the_tag() {
    let store = RecordingStore::new();
    store
        .inner
        .add(Task::new("t1", "Retire the billing flag").with_notes("@codex only"))
        .await;
    let bench = Bench::new();
    bench
        .script(ExecutorKind::Codex, vec![Step::Fail("exit status 2".into())])
        .await;
    let sink = Arc::new(CollectingSink::default());
    let orchestrator = Orchestrator::new(
        &fast_config(),
        Arc::new(store.clone()),
        bench.executor_set(),
        sink,
        Vec::new(),
        None,
    );

    orchestrator.run_once().await;

    // Note and tag land before the close
    let patches = store.patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].0, "t1");
    assert!(patches[0].1.add_tags.iter().any(|t| t == ESCALATION_TAG));
    assert!(patches[0]
        .1
        .append_notes
        .as_deref()
        .unwrap_or_default()
        .contains("fallback is disabled"));
    assert_eq!(store.inner.completed_ids().await, vec!["t1"]);
}

#[tokio::test]
async fn test_cancelled_cycle_is_silent() {
    let rig = rig();
    rig.store.add(Task::new("t-a", "Water the office plants")).await;
    rig.bench.script(ExecutorKind::Claude, vec![Step::Hang]).await;

    rig.orchestrator.start().await;
    wait_for_state(&rig.orchestrator, OrchestratorState::Working).await;
    rig.orchestrator.pause();
    assert!(rig.orchestrator.stop_current().await);

    tokio::time::sleep(Duration::from_millis(300)).await;

    // No completion, no escalation, task untouched
    assert!(rig.store.completed_ids().await.is_empty());
    let task = rig.store.get("t-a").await.unwrap();
    assert!(task.notes.is_empty());
    assert!(!rig.sink.events().iter().any(|event| matches!(
        event,
        OrchestratorEvent::TaskEscalated { .. } | OrchestratorEvent::CycleFailed { .. }
    )));
    assert_eq!(rig.bench.calls(ExecutorKind::Claude).await.len(), 1);

    rig.orchestrator.shutdown().await;
}
