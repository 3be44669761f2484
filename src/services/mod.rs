//! Services
//!
//! Business logic for the daemon: routing, execution strategies, the
//! task store client, and the orchestrator loop that ties them together.

pub mod events;
pub mod executors;
pub mod knowledge;
pub mod orchestrator;
pub mod policy;
pub mod prompt;
pub mod routing;
pub mod strategy;
pub mod task_store;

pub use events::{EventBus, EventSink, OrchestratorEvent, StatusSnapshot};
pub use orchestrator::Orchestrator;
pub use task_store::TaskStore;
