//! Utilities
//!
//! Shared helpers: error types, path resolution, text clipping.

pub mod error;
pub mod paths;
pub mod text;

pub use error::{AppError, AppResult};
