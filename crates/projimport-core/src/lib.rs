//! Core utilities and types shared across all projimport crates

pub mod openapi;
pub mod plugin;
pub mod problemdetails;
pub mod secret;

pub use problemdetails::{Problem, ProblemDetails};
pub use secret::SecretToken;

// Re-export external dependencies
pub use anyhow;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tracing;
