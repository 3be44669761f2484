//! Autonomous Task Orchestrator
//!
//! The daemon's heart: a waiting/picking/working/completing state machine
//! that polls the task store, routes each runnable task onto an executor,
//! runs one execution strategy per cycle and writes the outcome back.
//! `Orchestrator` is a cheap-to-clone handle; every control operation acts
//! on shared inner state so it works from any clone.

mod core;
mod cycle;
mod status;

pub use self::core::Orchestrator;
