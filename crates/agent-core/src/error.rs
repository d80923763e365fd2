//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// The agent could not understand its input payload
    #[error("Invalid agent input: {0}")]
    InvalidInput(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// A context value could not be (de)serialized
    #[error("Context value '{key}' is invalid: {detail}")]
    ContextValue { key: String, detail: String },
}
