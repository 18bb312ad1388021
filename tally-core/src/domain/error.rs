use thiserror::Error;

/// Errors that can occur during time tracking operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeTrackingError {
    /// Transport failure or a non-2xx response from the provider.
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication failed: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{0}")]
    Unknown(String),
}

impl TimeTrackingError {
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Errors an unattended reconcile pass swallows, keeping the local view.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Unauthorized(_))
    }
}
