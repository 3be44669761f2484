//! Orchestrator Loop Integration Tests
//!
//! The daemon loop through its public handle: pick ordering, pause and
//! resume, shutdown under a hanging executor, manual pick triggers, the
//! completion journal, and event delivery over the broadcast bus.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use taskpilot::models::{AppConfig, ExecutorKind, OrchestratorState, Task};
use taskpilot::services::events::{EventBus, OrchestratorEvent};
use taskpilot::services::knowledge::CompletionJournal;
use taskpilot::services::task_store::MemoryTaskStore;
use taskpilot::services::Orchestrator;

use crate::support::{
    fast_config, rig, wait_for_completion, wait_for_state, Bench, CollectingSink, Step,
};

// ============================================================================
// Loop behavior
// ============================================================================

#[tokio::test]
async fn test_loop_completes_tasks_in_order() {
    let rig = rig();
    rig.store.add(Task::new("t-a", "Water the office plants")).await;
    rig.store.add(Task::new("t-b", "Restock the coffee machine")).await;
    rig.bench
        .script(
            ExecutorKind::Claude,
            vec![Step::Succeed("a done".into()), Step::Succeed("b done".into())],
        )
        .await;

    rig.orchestrator.start().await;
    wait_for_completion(&rig.store, "t-b").await;
    rig.orchestrator.shutdown().await;

    assert_eq!(rig.store.completed_ids().await, vec!["t-a", "t-b"]);
    assert_eq!(rig.orchestrator.status().await.completed_count, 2);
}

#[tokio::test]
async fn test_pause_finishes_the_active_cycle_and_holds_the_next_pick() {
    let rig = rig();
    rig.store.add(Task::new("t-a", "Water the office plants")).await;
    rig.store.add(Task::new("t-b", "Restock the coffee machine")).await;
    rig.bench
        .script(
            ExecutorKind::Claude,
            vec![
                Step::SucceedAfter(Duration::from_millis(300), "a done".into()),
                Step::Succeed("b done".into()),
            ],
        )
        .await;

    rig.orchestrator.start().await;
    wait_for_state(&rig.orchestrator, OrchestratorState::Working).await;
    rig.orchestrator.pause();

    // The in-flight task still lands; the next one is not picked up
    wait_for_completion(&rig.store, "t-a").await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(rig.bench.calls(ExecutorKind::Claude).await.len(), 1);
    assert_eq!(rig.store.completed_ids().await, vec!["t-a"]);

    rig.orchestrator.resume();
    wait_for_completion(&rig.store, "t-b").await;
    rig.orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_pause_before_start_holds_all_picks() {
    let rig = rig();
    rig.store.add(Task::new("t-a", "Water the office plants")).await;
    rig.bench
        .script(ExecutorKind::Claude, vec![Step::Succeed("done".into())])
        .await;

    rig.orchestrator.pause();
    rig.orchestrator.start().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(rig.bench.calls(ExecutorKind::Claude).await.is_empty());
    assert!(rig.store.completed_ids().await.is_empty());

    rig.orchestrator.resume();
    wait_for_completion(&rig.store, "t-a").await;
    rig.orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_cancels_hanging_work_promptly() {
    let rig = rig();
    rig.store.add(Task::new("t-a", "Water the office plants")).await;
    rig.bench.script(ExecutorKind::Claude, vec![Step::Hang]).await;

    rig.orchestrator.start().await;
    wait_for_state(&rig.orchestrator, OrchestratorState::Working).await;

    let clock = std::time::Instant::now();
    rig.orchestrator.shutdown().await;
    assert!(
        clock.elapsed() < Duration::from_secs(2),
        "shutdown took {:?}",
        clock.elapsed()
    );

    // Cancellation is silent: nothing completed, nothing escalated
    assert!(rig.store.completed_ids().await.is_empty());
    assert!(!rig
        .sink
        .events()
        .iter()
        .any(|event| matches!(event, OrchestratorEvent::TaskEscalated { .. })));
}

#[tokio::test]
async fn test_trigger_pick_bypasses_the_poll_interval() {
    let config = AppConfig {
        poll_interval_secs: 3600,
        inter_task_delay_secs: 0,
        transport_cooldown_secs: 0,
        ..Default::default()
    };
    let bench = Bench::new();
    bench
        .script(ExecutorKind::Claude, vec![Step::Succeed("done".into())])
        .await;
    let store = MemoryTaskStore::new();
    let sink = Arc::new(CollectingSink::default());
    let orchestrator = Orchestrator::new(
        &config,
        Arc::new(store.clone()),
        bench.executor_set(),
        sink,
        Vec::new(),
        None,
    );

    // First pick finds nothing and the loop parks on the hour-long timer
    orchestrator.start().await;
    store.add(Task::new("t-late", "Water the office plants")).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !orchestrator.trigger_pick().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "trigger was never accepted"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    wait_for_completion(&store, "t-late").await;
    orchestrator.shutdown().await;
}

// ============================================================================
// Journal and events
// ============================================================================

#[tokio::test]
async fn test_completions_are_journaled() {
    let dir = TempDir::new().unwrap();
    let journal = Arc::new(CompletionJournal::at(dir.path().join("journal.jsonl")));

    let bench = Bench::new();
    bench
        .script(ExecutorKind::Claude, vec![Step::Succeed("done".into())])
        .await;
    let store = MemoryTaskStore::new();
    store
        .add(Task::new("t-a", "Water the office plants").with_project("office"))
        .await;
    let sink = Arc::new(CollectingSink::default());
    let orchestrator = Orchestrator::new(
        &fast_config(),
        Arc::new(store.clone()),
        bench.executor_set(),
        sink,
        Vec::new(),
        Some(journal.clone()),
    );

    orchestrator.run_once().await;

    // The append runs on its own task; poll until the line lands
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let entries = loop {
        let entries = journal.recent(5).await.unwrap();
        if !entries.is_empty() {
            break entries;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "journal entry never appeared"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    };

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].task_id, "t-a");
    assert_eq!(entries[0].title, "Water the office plants");
    assert_eq!(entries[0].project.as_deref(), Some("office"));
    assert_eq!(entries[0].executor, ExecutorKind::Claude);
    assert_eq!(entries[0].skill, "general");
}

#[tokio::test]
async fn test_event_bus_delivers_lifecycle_events() {
    let bench = Bench::new();
    bench
        .script(ExecutorKind::Claude, vec![Step::Succeed("done".into())])
        .await;
    let store = MemoryTaskStore::new();
    store.add(Task::new("t-a", "Water the office plants")).await;

    let bus = Arc::new(EventBus::new(64));
    let mut rx = bus.subscribe();
    let orchestrator = Orchestrator::new(
        &fast_config(),
        Arc::new(store.clone()),
        bench.executor_set(),
        bus.clone(),
        Vec::new(),
        None,
    );

    orchestrator.run_once().await;

    let mut saw_working = false;
    let mut saw_completed = false;
    while let Ok(Ok(event)) = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
        match event {
            OrchestratorEvent::StateChanged { snapshot }
                if snapshot.state == OrchestratorState::Working =>
            {
                saw_working = true;
            }
            OrchestratorEvent::TaskCompleted { task_id, .. } => {
                assert_eq!(task_id, "t-a");
                saw_completed = true;
            }
            _ => {}
        }
    }
    assert!(saw_working);
    assert!(saw_completed);
}
