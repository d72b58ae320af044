//! Centralized error types for the core primitives.

use std::time::Duration;
use thiserror::Error;

/// Main error type for core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{store} did not become ready after {attempts} attempt(s) in {elapsed:?}: {last_error}")]
    ReadinessTimeout {
        store: String,
        attempts: u32,
        elapsed: Duration,
        last_error: String,
    },

    #[error("Schema syntax error on line {line}: {message}")]
    SchemaSyntax { message: String, line: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
