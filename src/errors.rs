//! Error kinds for the optimization engine
//!
//! Three failure classes cross the engine boundary:
//! - `Validation`: malformed request, reported synchronously (400-class)
//! - `Catalogue`: catalogue or compatibility data unavailable (startup-fatal)
//! - `Evaluation`: a metric invariant was violated (internal bug, 500-class)
//!
//! Hitting the generation timeout is NOT an error: the engine returns its
//! best-so-far individuals with `StoppingReason::Timeout`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or inconsistent request fields.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Catalogue or compatibility matrix could not be loaded.
    #[error("catalogue unavailable: {0}")]
    Catalogue(String),

    /// A metric or fitness invariant was violated (score outside [0, 1],
    /// weight row not summing to 1).
    #[error("evaluation invariant violated: {0}")]
    Evaluation(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn catalogue(msg: impl Into<String>) -> Self {
        EngineError::Catalogue(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        EngineError::Evaluation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
