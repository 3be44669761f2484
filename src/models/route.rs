//! Routing Models
//!
//! The routing engine's output (`RouteDecision`) and the per-cycle
//! append-only route history. The "current" route is always the last
//! recorded transition, so the full fallback history stays inspectable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::execution::ExecutorKind;

/// Per-executor affinity scores from keyword classification.
///
/// Overrides use sentinel values (10 for the pinned executor) so the
/// scores stay readable in status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffinityScores {
    pub claude: u32,
    pub codex: u32,
    pub gemini: u32,
}

impl AffinityScores {
    /// Score for a single executor.
    pub fn get(&self, kind: ExecutorKind) -> u32 {
        match kind {
            ExecutorKind::Claude => self.claude,
            ExecutorKind::Codex => self.codex,
            ExecutorKind::Gemini => self.gemini,
        }
    }

    /// Set the score for a single executor.
    pub fn set(&mut self, kind: ExecutorKind, score: u32) {
        match kind {
            ExecutorKind::Claude => self.claude = score,
            ExecutorKind::Codex => self.codex = score,
            ExecutorKind::Gemini => self.gemini = score,
        }
    }

    /// Scores paired with executors, ranked descending. Equal scores keep
    /// the fixed executor priority order (claude, codex, gemini).
    pub fn ranked(&self) -> Vec<(ExecutorKind, u32)> {
        let mut pairs: Vec<(ExecutorKind, u32)> =
            ExecutorKind::ALL.iter().map(|k| (*k, self.get(*k))).collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1));
        pairs
    }

    /// Build scores that pin one executor at `score` and zero the rest.
    pub fn pinned(kind: ExecutorKind, score: u32) -> Self {
        let mut scores = Self::default();
        scores.set(kind, score);
        scores
    }
}

/// Output of classifying a task onto an executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDecision {
    /// Selected executor
    pub executor: ExecutorKind,
    /// Concrete agent identifier for that executor (e.g. "claude-code")
    pub agent_id: String,
    /// Skill label that drove the decision (rule label or override name)
    pub skill: String,
    /// Human-readable reason, including the reason code for ties
    pub reason: String,
    /// Affinity scores per executor
    pub scores: AffinityScores,
    /// Policy-pinned decision; fallback must not silently override it
    pub strict: bool,
}

/// One entry of the per-cycle route history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTransition {
    /// Executor the cycle moved to
    pub executor: ExecutorKind,
    /// Why the transition happened (initial route, fallback, tertiary...)
    pub reason: String,
    /// When the transition was recorded
    pub at: DateTime<Utc>,
}

/// Append-only sequence of route transitions for one cycle.
///
/// Strategies never overwrite the current route; they append a transition
/// with a reason and "current" is defined as the last entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteHistory {
    transitions: Vec<RouteTransition>,
}

impl RouteHistory {
    /// Empty history for a fresh cycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition.
    pub fn record(&mut self, executor: ExecutorKind, reason: impl Into<String>) {
        self.transitions.push(RouteTransition {
            executor,
            reason: reason.into(),
            at: Utc::now(),
        });
    }

    /// The executor currently routed to, if any transition was recorded.
    pub fn current(&self) -> Option<ExecutorKind> {
        self.transitions.last().map(|t| t.executor)
    }

    /// All transitions, oldest first.
    pub fn transitions(&self) -> &[RouteTransition] {
        &self.transitions
    }

    /// Number of transitions recorded.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// True when no transition was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
