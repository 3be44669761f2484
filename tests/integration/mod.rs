//! Integration Tests Module
//!
//! End-to-end tests for the taskpilot daemon through its public API.
//! Tests cover the routing cascade, strategy selection under runtime
//! configuration, discussion cycles, the failure policy's store
//! write-backs, and the orchestrator loop: pause/resume, shutdown,
//! manual picks, and the event and journal trails of a cycle.

// Shared fixtures: scripted executors, collecting sink, polling helpers
mod support;

// Routing cascade precedence and keyword classification
mod routing_test;

// Strategy selection driven by runtime configuration
mod strategy_test;

// Discussion cycles end to end
mod discussion_test;

// Failure handling and store write-back
mod policy_test;

// Orchestrator loop lifecycle and control surface
mod orchestrator_test;
