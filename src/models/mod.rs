//! Data models for taskpilot

pub mod execution;
pub mod route;
pub mod settings;
pub mod task;

pub use execution::{
    DiscussionTurn, ExecutionResult, ExecutorKind, ExecutorRunState, OrchestratorState, TokenUsage,
};
pub use route::{AffinityScores, RouteDecision, RouteHistory, RouteTransition};
pub use settings::{
    AppConfig, ExecutorMode, ExecutorProcessConfig, ExecutorsConfig, RuntimeConfig,
    RuntimeConfigUpdate,
};
pub use task::{ChecklistItem, Task, TaskPatch};
