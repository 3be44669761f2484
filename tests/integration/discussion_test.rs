//! Discussion Mode Integration Tests
//!
//! Discussion cycles through the live loop: early exit on the readiness
//! marker, recovery from a failed turn, and escalation when the finisher
//! itself fails.

use taskpilot::models::{ExecutorKind, RuntimeConfigUpdate, Task};
use taskpilot::services::events::OrchestratorEvent;

use crate::support::{rig, Rig, Step};

async fn discussion_rig(max_turns: u8) -> Rig {
    let rig = rig();
    rig.orchestrator
        .update_config(RuntimeConfigUpdate {
            discussion_mode: Some(true),
            discussion_max_turns: Some(max_turns),
            ..Default::default()
        })
        .await;
    rig
}

#[tokio::test]
async fn test_readiness_marker_ends_the_discussion_early() {
    let rig = discussion_rig(3).await;
    rig.store.add(Task::new("t1", "Water the office plants")).await;
    rig.bench
        .script(
            ExecutorKind::Claude,
            vec![
                Step::Succeed("start with the planter row".into()),
                Step::Succeed("implemented".into()),
            ],
        )
        .await;
    rig.bench
        .script(
            ExecutorKind::Codex,
            vec![Step::Succeed("agreed, READY_TO_IMPLEMENT".into())],
        )
        .await;

    rig.orchestrator.run_once().await;

    assert_eq!(rig.store.completed_ids().await, vec!["t1"]);

    // Turn three never runs; the finisher sees both recorded turns
    let claude_calls = rig.bench.calls(ExecutorKind::Claude).await;
    assert_eq!(claude_calls.len(), 2);
    assert_eq!(rig.bench.calls(ExecutorKind::Codex).await.len(), 1);
    assert!(claude_calls[1].contains("start with the planter row"));
    assert!(claude_calls[1].contains("READY_TO_IMPLEMENT"));
}

#[tokio::test]
async fn test_failed_turn_still_reaches_execution() {
    let rig = discussion_rig(3).await;
    rig.store.add(Task::new("t1", "Water the office plants")).await;
    rig.bench
        .script(
            ExecutorKind::Claude,
            vec![
                Step::Fail("no capacity".into()),
                Step::Succeed("recovered".into()),
            ],
        )
        .await;

    rig.orchestrator.run_once().await;

    // Turn one failed; the finisher still lands the task
    assert_eq!(rig.store.completed_ids().await, vec!["t1"]);
    assert_eq!(rig.bench.calls(ExecutorKind::Claude).await.len(), 2);
    assert!(rig.bench.calls(ExecutorKind::Codex).await.is_empty());
}

#[tokio::test]
async fn test_finisher_failure_escalates_and_closes() {
    let rig = discussion_rig(2).await;
    rig.store.add(Task::new("t1", "Water the office plants")).await;
    rig.bench
        .script(
            ExecutorKind::Claude,
            vec![
                Step::Succeed("plan line".into()),
                Step::Fail("exit status 1".into()),
            ],
        )
        .await;
    rig.bench
        .script(ExecutorKind::Codex, vec![Step::Succeed("agreed".into())])
        .await;

    rig.orchestrator.run_once().await;

    // The plan is not handed to another executor; the task is closed out
    assert_eq!(rig.store.completed_ids().await, vec!["t1"]);
    assert!(rig.sink.events().iter().any(|event| matches!(
        event,
        OrchestratorEvent::TaskEscalated { closed: true, note, .. }
            if note.contains("claude") && note.contains("exit status 1")
    )));
}
