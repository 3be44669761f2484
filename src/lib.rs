//! Taskpilot - Autonomous Task Development Orchestrator
//!
//! This library implements the daemon that watches a task store, routes
//! each open task to the best-suited CLI coding agent, and drives it to
//! completion. It includes:
//! - Keyword routing with mention, section, and tag overrides
//! - Execution strategies (fallback chain, parallel writer, discussion)
//! - Task store clients and a layered failure policy
//! - Storage layer (config) and data models

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::{AppConfig, RuntimeConfig, RuntimeConfigUpdate};
pub use models::{ExecutorKind, OrchestratorState, Task};
pub use services::{Orchestrator, StatusSnapshot};
pub use utils::error::{AppError, AppResult};
