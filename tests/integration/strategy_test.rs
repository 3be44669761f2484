//! Strategy Selection Integration Tests
//!
//! Full task cycles through `run_once` under each runtime configuration:
//! the default fallback chain, the parallel advisory shadow, discussion
//! mode, forced mode, and the escalation path for a blocked strict route.

use taskpilot::models::{ExecutorKind, RuntimeConfigUpdate, Task};
use taskpilot::services::events::OrchestratorEvent;

use crate::support::{rig, Step};

// ============================================================================
// Fallback chain
// ============================================================================

#[tokio::test]
async fn test_default_config_walks_the_fallback_chain() {
    let rig = rig();
    rig.store.add(Task::new("t1", "Water the office plants")).await;
    rig.bench
        .script(ExecutorKind::Claude, vec![Step::Fail("exit status 1".into())])
        .await;
    rig.bench
        .script(ExecutorKind::Codex, vec![Step::Succeed("rescued".into())])
        .await;

    rig.orchestrator.run_once().await;

    assert_eq!(rig.store.completed_ids().await, vec!["t1"]);
    assert_eq!(rig.bench.calls(ExecutorKind::Claude).await.len(), 1);
    assert_eq!(rig.bench.calls(ExecutorKind::Codex).await.len(), 1);
    assert!(rig.bench.calls(ExecutorKind::Gemini).await.is_empty());

    let events = rig.sink.events();
    assert!(events.iter().any(|event| matches!(
        event,
        OrchestratorEvent::RouteSwitched { executor: ExecutorKind::Codex, reason, .. }
            if reason.contains("falling back")
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        OrchestratorEvent::TaskCompleted { executor: ExecutorKind::Codex, .. }
    )));
}

// ============================================================================
// Parallel advisory shadow
// ============================================================================

#[tokio::test]
async fn test_parallel_execution_adds_an_advisory_shadow() {
    let rig = rig();
    rig.orchestrator
        .update_config(RuntimeConfigUpdate {
            parallel_execution: Some(true),
            ..Default::default()
        })
        .await;
    rig.store.add(Task::new("t1", "Water the office plants")).await;
    rig.bench
        .script(ExecutorKind::Claude, vec![Step::Succeed("written".into())])
        .await;
    rig.bench
        .script(ExecutorKind::Codex, vec![Step::Succeed("advice".into())])
        .await;

    rig.orchestrator.run_once().await;

    assert_eq!(rig.store.completed_ids().await, vec!["t1"]);

    // The writer gets the execution prompt, the shadow the advisory one
    let claude_calls = rig.bench.calls(ExecutorKind::Claude).await;
    let codex_calls = rig.bench.calls(ExecutorKind::Codex).await;
    assert_eq!(claude_calls.len(), 1);
    assert_eq!(codex_calls.len(), 1);
    assert!(!claude_calls[0].contains("ADVISORY"));
    assert!(codex_calls[0].contains("ADVISORY"));
    assert!(rig.bench.calls(ExecutorKind::Gemini).await.is_empty());

    assert!(rig.sink.events().iter().any(|event| matches!(
        event,
        OrchestratorEvent::TaskCompleted { executor: ExecutorKind::Claude, .. }
    )));
}

#[tokio::test]
async fn test_strict_routes_never_run_a_shadow() {
    let rig = rig();
    rig.orchestrator
        .update_config(RuntimeConfigUpdate {
            parallel_execution: Some(true),
            ..Default::default()
        })
        .await;
    rig.store
        .add(Task::new("t1", "Retire the billing flag").with_notes("@claude only, please"))
        .await;
    rig.bench
        .script(ExecutorKind::Claude, vec![Step::Succeed("done".into())])
        .await;

    rig.orchestrator.run_once().await;

    assert_eq!(rig.store.completed_ids().await, vec!["t1"]);
    assert_eq!(rig.bench.calls(ExecutorKind::Claude).await.len(), 1);
    assert!(rig.bench.calls(ExecutorKind::Codex).await.is_empty());
    assert!(rig.bench.calls(ExecutorKind::Gemini).await.is_empty());
}

// ============================================================================
// Discussion mode
// ============================================================================

#[tokio::test]
async fn test_discussion_mode_negotiates_then_executes() {
    let rig = rig();
    rig.orchestrator
        .update_config(RuntimeConfigUpdate {
            discussion_mode: Some(true),
            discussion_max_turns: Some(2),
            ..Default::default()
        })
        .await;
    rig.store.add(Task::new("t1", "Water the office plants")).await;
    rig.bench
        .script(
            ExecutorKind::Claude,
            vec![
                Step::Succeed("plan: use the small can".into()),
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

    // Two speaker turns, then the first speaker implements the plan
    let claude_calls = rig.bench.calls(ExecutorKind::Claude).await;
    let codex_calls = rig.bench.calls(ExecutorKind::Codex).await;
    assert_eq!(claude_calls.len(), 2);
    assert_eq!(codex_calls.len(), 1);
    assert!(codex_calls[0].contains("plan: use the small can"));
    assert!(claude_calls[1].contains("Agreed Plan"));
}

// ============================================================================
// Forced mode
// ============================================================================

#[tokio::test]
async fn test_forced_mode_pins_every_cycle() {
    let rig = rig();
    rig.orchestrator
        .update_config(RuntimeConfigUpdate {
            executor_mode: Some("gemini".to_string()),
            ..Default::default()
        })
        .await;
    rig.store.add(Task::new("t1", "Fix the login crash")).await;
    rig.bench
        .script(ExecutorKind::Gemini, vec![Step::Succeed("done".into())])
        .await;

    rig.orchestrator.run_once().await;

    assert_eq!(rig.store.completed_ids().await, vec!["t1"]);

    // Codex-leaning text still runs under the pinned family
    assert!(rig.bench.calls(ExecutorKind::Codex).await.is_empty());
    assert_eq!(rig.bench.calls(ExecutorKind::Gemini).await.len(), 1);
    assert!(rig.sink.events().iter().any(|event| matches!(
        event,
        OrchestratorEvent::TaskCompleted { executor: ExecutorKind::Gemini, .. }
    )));
}

// ============================================================================
// Escalation
// ============================================================================

#[tokio::test]
async fn test_blocked_strict_route_escalates_and_closes() {
    let rig = rig();
    rig.store
        .add(Task::new("t1", "Pull the usage numbers").with_notes("@gemini has the data access"))
        .await;
    rig.bench
        .script(
            ExecutorKind::Gemini,
            vec![Step::Fail("run aborted: quota exceeded for org".into())],
        )
        .await;

    rig.orchestrator.run_once().await;

    // Closed out of the queue with the blocking signal in the note
    assert_eq!(rig.store.completed_ids().await, vec!["t1"]);
    assert!(rig.sink.events().iter().any(|event| matches!(
        event,
        OrchestratorEvent::TaskEscalated { closed: true, note, .. }
            if note.contains("blocking runtime signal") && note.contains("quota exceeded")
    )));
    assert!(rig.bench.calls(ExecutorKind::Claude).await.is_empty());
    assert!(rig.bench.calls(ExecutorKind::Codex).await.is_empty());
}
