//! Storage Layer
//!
//! Local persistence: the JSON bootstrap configuration.

pub mod config;

pub use config::ConfigService;
