use std::time::Duration;

use thiserror::Error;

/// Failure of a call to an external capability.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapabilityError {
    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Call was cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    #[error("Index error: {0}")]
    Index(String),
}

impl CapabilityError {
    /// Whether a retry could plausibly succeed. Cancellation never qualifies.
    pub fn is_transient(&self) -> bool {
        match self {
            CapabilityError::Timeout(_) | CapabilityError::Transport(_) => true,
            CapabilityError::Provider { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CapabilityError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(CapabilityError::Transport("reset".into()).is_transient());
        assert!(CapabilityError::Provider {
            status: 429,
            message: "slow down".into()
        }
        .is_transient());
        assert!(CapabilityError::Provider {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());

        assert!(!CapabilityError::Cancelled.is_transient());
        assert!(!CapabilityError::Provider {
            status: 401,
            message: "bad key".into()
        }
        .is_transient());
        assert!(!CapabilityError::MalformedResponse("empty".into()).is_transient());
    }
}
