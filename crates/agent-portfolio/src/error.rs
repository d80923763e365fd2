//! Error types for portfolio agent operations
//!
//! The allocation calculator and the report composer never fail. Errors only
//! arise at the edges: decoding agent input, loading configuration, and
//! talking to upstream agents.

use thiserror::Error;

/// Portfolio agent specific errors
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Agent input could not be decoded
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An upstream analyst agent failed
    #[error("Analyst '{agent}' failed: {reason}")]
    AnalystFailed {
        agent: String,
        reason: String,
    },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for portfolio operations
pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Convert PortfolioError to agent_core::Error
impl From<PortfolioError> for agent_core::Error {
    fn from(err: PortfolioError) -> Self {
        match err {
            PortfolioError::InvalidInput(msg) => agent_core::Error::InvalidInput(msg),
            other => agent_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortfolioError::ConfigError("bad thresholds".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad thresholds");

        let err = PortfolioError::AnalystFailed {
            agent: "macro".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Analyst 'macro' failed: timeout");
    }

    #[test]
    fn test_invalid_input_keeps_variant() {
        let err: agent_core::Error = PortfolioError::InvalidInput("not json".to_string()).into();
        assert!(matches!(err, agent_core::Error::InvalidInput(msg) if msg == "not json"));
    }

    #[test]
    fn test_other_errors_become_processing_failed() {
        let err: agent_core::Error = PortfolioError::ConfigError("boom".to_string()).into();
        match err {
            agent_core::Error::ProcessingFailed(msg) => assert_eq!(msg, "Configuration error: boom"),
            _ => panic!("Expected ProcessingFailed variant"),
        }
    }
}
