//! Routing Cascade Integration Tests
//!
//! Task-shaped inputs through the public routing entry point: override
//! precedence end to end, mention detection across every task surface,
//! and keyword classification for all three families.

use taskpilot::models::{ExecutorKind, RuntimeConfig, Task};
use taskpilot::services::routing::route;

fn auto() -> RuntimeConfig {
    RuntimeConfig::default()
}

fn forced(mode: &str) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.executor_mode = mode.to_string().into();
    config
}

// ============================================================================
// Override precedence
// ============================================================================

#[test]
fn test_mention_beats_section_override() {
    let task = Task::new("t1", "Port the importer")
        .with_notes("@codex should take this one")
        .with_section("claude");
    let decision = route(&task, &auto());
    assert_eq!(decision.executor, ExecutorKind::Codex);
    assert!(decision.strict);
    assert_eq!(decision.skill, "mention-override");
}

#[test]
fn test_section_beats_tag_override() {
    let task = Task::new("t2", "Port the importer")
        .with_section("gemini")
        .with_tag("claude");
    let decision = route(&task, &auto());
    assert_eq!(decision.executor, ExecutorKind::Gemini);
    assert!(decision.strict);
    assert_eq!(decision.skill, "section-override");
}

#[test]
fn test_tag_beats_forced_mode() {
    let task = Task::new("t3", "Port the importer").with_tag("oai");
    let decision = route(&task, &forced("gemini"));
    assert_eq!(decision.executor, ExecutorKind::Codex);
    assert!(decision.strict);
    assert_eq!(decision.skill, "tag-override");
}

#[test]
fn test_forced_mode_beats_classification() {
    // Text that would classify to codex on its own
    let task = Task::new("t4", "Implement tests for the new endpoint");
    let decision = route(&task, &forced("gemini"));
    assert_eq!(decision.executor, ExecutorKind::Gemini);
    assert!(decision.strict);
    assert_eq!(decision.skill, "forced-mode");
    // Forced-mode affinity is pinned, not classified
    assert_eq!(decision.scores.gemini, 1);
    assert_eq!(decision.scores.codex, 0);
}

// ============================================================================
// Mention detection
// ============================================================================

#[test]
fn test_mention_in_a_checklist_item_is_seen() {
    let task = Task::new("t5", "Quarterly comparison")
        .with_checklist_item("ask @gemini to pull the numbers", false);
    let decision = route(&task, &auto());
    assert_eq!(decision.executor, ExecutorKind::Gemini);
    assert!(decision.strict);
    assert_eq!(decision.skill, "mention-override");
}

#[test]
fn test_email_addresses_are_not_mentions() {
    let task = Task::new("t6", "Forward the weekly report to claude@example.com");
    let decision = route(&task, &auto());
    // No inline mention, so nothing pins the route
    assert!(!decision.strict);
    assert_ne!(decision.skill, "mention-override");
}

#[test]
fn test_decoy_section_spellings_still_pin() {
    for section in ["Cluade", "calude", "  CLAUDE  "] {
        let task = Task::new("t7", "Anything at all").with_section(section);
        let decision = route(&task, &auto());
        assert_eq!(decision.executor, ExecutorKind::Claude, "section {section:?}");
        assert!(decision.strict);
    }
}

// ============================================================================
// Keyword classification
// ============================================================================

#[test]
fn test_research_phrasings_route_to_gemini() {
    let task = Task::new("t8", "Investigate and compare vector databases");
    let decision = route(&task, &auto());
    assert_eq!(decision.executor, ExecutorKind::Gemini);
    assert!(!decision.strict);
    assert_eq!(decision.skill, "research");
    assert!(decision.reason.contains("keyword classification"));
}

#[test]
fn test_bugfix_phrasings_route_to_codex() {
    let task = Task::new("t9", "Fix the crash in the nightly export job");
    let decision = route(&task, &auto());
    assert_eq!(decision.executor, ExecutorKind::Codex);
    assert!(!decision.strict);
    assert_eq!(decision.skill, "bugfix");
}

#[test]
fn test_docs_phrasings_route_to_claude() {
    let task = Task::new("t10", "Update the README and changelog for the release");
    let decision = route(&task, &auto());
    assert_eq!(decision.executor, ExecutorKind::Claude);
    assert!(!decision.strict);
    assert_eq!(decision.skill, "writing");
}

#[test]
fn test_skill_comes_from_the_highest_scoring_rule() {
    // translation matches once at weight 1, frontend twice at weight 2:
    // the family wins on the sum but the skill cites the top rule
    let task = Task::new("t11", "Translate the marketing pages and polish the CSS layout");
    let decision = route(&task, &auto());
    assert_eq!(decision.executor, ExecutorKind::Gemini);
    assert_eq!(decision.skill, "frontend");
    assert_eq!(decision.scores.gemini, 5);
}

#[test]
fn test_balanced_task_falls_back_to_the_default_family() {
    // "refactor" and "implement" score claude and codex identically
    let task = Task::new("t12", "Refactor and implement");
    let decision = route(&task, &auto());
    assert_eq!(decision.scores.claude, decision.scores.codex);
    assert!(decision.scores.claude > 0);
    assert_eq!(decision.executor, ExecutorKind::Claude);
    assert!(!decision.strict);
    assert!(decision.reason.contains("tie-break"));
}

#[test]
fn test_keywordless_task_falls_back_to_the_default_family() {
    let task = Task::new("t13", "Prepare the quarterly planning agenda");
    let decision = route(&task, &auto());
    assert_eq!(decision.executor, ExecutorKind::Claude);
    assert!(!decision.strict);
    assert_eq!(decision.skill, "general");
    assert!(decision.reason.contains("no-match"));
}

#[test]
fn test_agent_ids_track_the_routed_family() {
    let cases = [
        ("Investigate and compare caches", "gemini-cli"),
        ("Fix the login crash", "codex-cli"),
        ("Prepare the quarterly planning agenda", "claude-code"),
    ];
    for (title, agent_id) in cases {
        let decision = route(&Task::new("t14", title), &auto());
        assert_eq!(decision.agent_id, agent_id, "title {title:?}");
    }
}
