//! Execution Models
//!
//! Executor identities, per-cycle runtime state, execution results, and
//! discussion transcript entries.

use serde::{Deserialize, Serialize};

/// The three interchangeable coding executors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    /// Claude Code CLI
    Claude,
    /// Codex CLI
    Codex,
    /// Gemini CLI
    Gemini,
}

impl ExecutorKind {
    /// All executors in fixed priority order (claude first).
    pub const ALL: [ExecutorKind; 3] =
        [ExecutorKind::Claude, ExecutorKind::Codex, ExecutorKind::Gemini];

    /// Stable string identifier.
    pub fn id(&self) -> &'static str {
        match self {
            ExecutorKind::Claude => "claude",
            ExecutorKind::Codex => "codex",
            ExecutorKind::Gemini => "gemini",
        }
    }

    /// Parse a string identifier; unknown values return None.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Some(ExecutorKind::Claude),
            "codex" => Some(ExecutorKind::Codex),
            "gemini" => Some(ExecutorKind::Gemini),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Token usage reported by an executor invocation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Prompt-side tokens
    pub input_tokens: u64,
    /// Completion-side tokens
    pub output_tokens: u64,
}

/// Final output of one successful executor invocation.
///
/// `executor` records who actually produced the result; after fallback it
/// may differ from the executor the route originally named.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Output transcript/content
    pub content: String,
    /// Model identifier reported by the executor
    pub model: String,
    /// Provider identifier reported by the executor
    pub provider: String,
    /// Token usage
    #[serde(default)]
    pub usage: TokenUsage,
    /// Executor that produced this result
    pub executor: ExecutorKind,
}

/// One entry in a discussion transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionTurn {
    /// Zero-based turn index
    pub index: usize,
    /// Executor that spoke this turn
    pub executor: ExecutorKind,
    /// Turn content
    pub content: String,
}

/// Per-executor runtime state within one cycle.
///
/// Reset to `Idle` for every executor at the start of each cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorRunState {
    /// Not invoked this cycle (yet)
    #[default]
    Idle,
    /// Invocation in flight
    Running,
    /// Last invocation this cycle succeeded
    Success,
    /// Last invocation this cycle failed
    Error,
}

impl std::fmt::Display for ExecutorRunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutorRunState::Idle => write!(f, "idle"),
            ExecutorRunState::Running => write!(f, "running"),
            ExecutorRunState::Success => write!(f, "success"),
            ExecutorRunState::Error => write!(f, "error"),
        }
    }
}

/// Top-level orchestrator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    /// No active cycle; scheduling timers may be pending
    #[default]
    Waiting,
    /// Fetching and partitioning tasks from the store
    Picking,
    /// A task cycle is executing
    Working,
    /// Finalizing a completed cycle (store writes, events)
    Completing,
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorState::Waiting => write!(f, "waiting"),
            OrchestratorState::Picking => write!(f, "picking"),
            OrchestratorState::Working => write!(f, "working"),
            OrchestratorState::Completing => write!(f, "completing"),
        }
    }
}
