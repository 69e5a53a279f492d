//! Top-level error type for the demo
//!
//! The original demo enforced "this call must succeed" with runtime asserts.
//! Here every state-transition operation returns an explicit `Result` and
//! the layers converge into [`DemoError`]; the binary chooses to halt on
//! `Err`, preserving the fail-fast behavior without crash-on-assert.

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::session::negotiator::SessionError;
use crate::session::topics::TopicError;
use crate::transport::TransportError;
use thiserror::Error;

/// Any failure that terminates a demo iteration
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("session negotiation failed: {0}")]
    Session(#[from] SessionError),

    #[error("protocol engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("topic table error: {0}")]
    Topics(#[from] TopicError),
}

/// Result type for demo operations
pub type DemoResult<T> = Result<T, DemoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions_and_display() {
        let errors: Vec<DemoError> = vec![
            ConfigError::Invalid("bad".to_string()).into(),
            SessionError::AuthProbeAccepted.into(),
            EngineError::NotConnected.into(),
            TransportError::NotConnected.into(),
            TopicError::FilterTooLong {
                filter: "x".to_string(),
                limit: 100,
            }
            .into(),
        ];
        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }
}
