//! Routing Engine
//!
//! Maps a task to a `RouteDecision` through a strict priority cascade:
//!
//! 1. Inline mention override (`@claude` etc. anywhere in the task text)
//! 2. Section/heading override (family alias sets)
//! 3. Tag override (same aliases, executors checked in priority order)
//! 4. Forced executor mode
//! 5. Weighted keyword classification (the auto default)
//!
//! Pure and total: no state, no I/O, always returns a decision. Levels
//! 1-4 produce `strict = true`, which later disables fallback for the
//! cycle.

pub mod rules;

use crate::models::{
    AffinityScores, ExecutorKind, ExecutorMode, RouteDecision, RuntimeConfig, Task,
};
use crate::services::executors::catalog;

use rules::{score_executor, ExecutorScore};

/// Affinity score reported for explicit overrides.
const OVERRIDE_SCORE: u32 = 10;
/// Affinity score reported for forced mode, kept minimal so a pinned
/// decision is visually distinct from a real classification.
const FORCED_SCORE: u32 = 1;

/// Decide which executor handles a task.
pub fn route(task: &Task, config: &RuntimeConfig) -> RouteDecision {
    let combined = task.combined_text();

    // Level 1: inline mention override
    for kind in ExecutorKind::ALL {
        if catalog::mention_regex(kind).is_some_and(|re| re.is_match(&combined)) {
            return decision(
                kind,
                "mention-override",
                format!("inline @{} mention in task text", kind.id()),
                AffinityScores::pinned(kind, OVERRIDE_SCORE),
                true,
            );
        }
    }

    // Level 2: section/heading override
    if let Some(section) = &task.section {
        if let Some(kind) = catalog::match_alias(section) {
            return decision(
                kind,
                "section-override",
                format!("section '{}' belongs to the {} family", section, kind.id()),
                AffinityScores::pinned(kind, OVERRIDE_SCORE),
                true,
            );
        }
    }

    // Level 3: tag override, executors checked in fixed priority order
    for kind in ExecutorKind::ALL {
        if let Some(tag) = task
            .tags
            .iter()
            .find(|tag| catalog::match_alias(tag) == Some(kind))
        {
            return decision(
                kind,
                "tag-override",
                format!("tag '{}' belongs to the {} family", tag, kind.id()),
                AffinityScores::pinned(kind, OVERRIDE_SCORE),
                true,
            );
        }
    }

    // Level 4: forced executor mode
    if let ExecutorMode::Fixed(kind) = config.executor_mode {
        return decision(
            kind,
            "forced-mode",
            format!("executor mode pinned to {}", kind.id()),
            AffinityScores::pinned(kind, FORCED_SCORE),
            true,
        );
    }

    // Level 5: weighted keyword classification
    classify(&combined)
}

/// Weighted keyword classification over all three rule tables.
fn classify(combined: &str) -> RouteDecision {
    let lowered = combined.to_lowercase();

    let mut scores = AffinityScores::default();
    let mut breakdown: Vec<(ExecutorKind, ExecutorScore)> = Vec::new();
    for kind in ExecutorKind::ALL {
        let score = score_executor(kind, combined, &lowered);
        scores.set(kind, score.total);
        breakdown.push((kind, score));
    }

    let ranked = scores.ranked();
    let (top_kind, top_score) = ranked[0];
    let (runner_kind, runner_score) = ranked[1];

    if top_score == 0 {
        return decision(
            catalog::RELIABILITY_DEFAULT,
            "general",
            format!(
                "no-match: no keyword rules matched, defaulting to {}",
                catalog::RELIABILITY_DEFAULT.id()
            ),
            scores,
            false,
        );
    }

    if top_score == runner_score {
        return decision(
            catalog::RELIABILITY_DEFAULT,
            "general",
            format!(
                "tie-break: {} and {} both scored {}, defaulting to {}",
                top_kind.id(),
                runner_kind.id(),
                top_score,
                catalog::RELIABILITY_DEFAULT.id()
            ),
            scores,
            false,
        );
    }

    let winner = breakdown
        .iter()
        .find(|(kind, _)| *kind == top_kind)
        .map(|(_, s)| s.clone())
        .unwrap_or_default();
    let runner_up = breakdown
        .iter()
        .find(|(kind, _)| *kind == runner_kind)
        .map(|(_, s)| s.clone())
        .unwrap_or_default();

    let skill = winner
        .top_rule
        .map(|(label, _)| label)
        .unwrap_or("general");

    let reason = format!(
        "keyword classification: {} {} [{}] over {} {} [{}]",
        top_kind.id(),
        top_score,
        winner.matched_labels.join(", "),
        runner_kind.id(),
        runner_score,
        if runner_up.matched_labels.is_empty() {
            "no matches".to_string()
        } else {
            runner_up.matched_labels.join(", ")
        },
    );

    decision(top_kind, skill, reason, scores, false)
}

fn decision(
    executor: ExecutorKind,
    skill: &str,
    reason: String,
    scores: AffinityScores,
    strict: bool,
) -> RouteDecision {
    RouteDecision {
        executor,
        agent_id: catalog::profile(executor).agent_id.to_string(),
        skill: skill.to_string(),
        reason,
        scores,
        strict,
    }
}
