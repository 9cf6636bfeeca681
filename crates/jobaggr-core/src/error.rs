use thiserror::Error;

/// Application-wide error types for jobaggr.
///
/// Every variant except [`AppError::Cancelled`] and
/// [`AppError::DeadlineExceeded`] describes a source failure. The aggregator
/// hands source errors to the caller untouched.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// A request or source invocation exceeded its own time limit, in
    /// milliseconds.
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// A source response could not be decoded into job records.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Local file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source panicked instead of returning a result.
    #[error("Source '{name}' panicked")]
    SourcePanicked { name: String },

    /// The search context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The search context's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if the error came from the search context rather than
    /// from a source.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AppError::Cancelled | AppError::DeadlineExceeded)
    }

    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::DeadlineExceeded => true,
            AppError::HttpError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            _ => false,
        }
    }
}
