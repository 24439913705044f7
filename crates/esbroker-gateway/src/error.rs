//! Gateway error types.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors returned by the cluster provider or the transport to it.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("ResourceAlreadyExistsException: {0}")]
    AlreadyExists(String),

    #[error("ResourceNotFoundException: {0}")]
    NotFound(String),

    #[error("{code}: {message}")]
    Rejected { code: String, message: String },

    #[error("throttled: {0}")]
    Throttled(String),

    #[error("provider error ({status}) {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("missing provider credentials: {0}")]
    Credentials(String),

    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether a retry of an idempotent call might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Throttled(_)
                | GatewayError::Service { .. }
                | GatewayError::Transport(_)
                | GatewayError::Timeout(_)
        )
    }
}
