//! Error types for the solve Lambda.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Status used when the upstream gives no usable HTTP status of its own.
pub const BAD_GATEWAY: u16 = 502;

/// Every way a solve request can fail.
///
/// The `Display` text is the human-readable `error` message returned to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// Anything other than POST
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Request body is not valid JSON
    #[error("Invalid JSON")]
    InvalidJson(#[from] serde_json::Error),

    /// Question empty after normalization
    #[error("Question is required")]
    MissingQuestion,

    /// Question longer than the configured ceiling
    #[error("Question too long")]
    QuestionTooLong { length: usize, max: usize },

    /// Per-client quota exhausted
    #[error("Rate limit exceeded. Try again later.")]
    RateLimited,

    /// No upstream credential configured on the server
    #[error("GEMINI_API_KEY not configured on server")]
    MissingCredential,

    /// Upstream returned a failure status, an explicit error object, or nothing usable
    #[error("Upstream error")]
    Upstream { status: Option<u16>, detail: String },

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Unexpected failure, such as a panic inside the pipeline
    #[error("{0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(err.to_string())
    }
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MethodNotAllowed => 405,
            Error::InvalidJson(_) | Error::MissingQuestion | Error::QuestionTooLong { .. } => 400,
            Error::RateLimited => 429,
            Error::Upstream { status, .. } => status.unwrap_or(BAD_GATEWAY),
            Error::MissingCredential | Error::Aws(_) | Error::Internal(_) => 500,
        }
    }

    /// Optional diagnostic detail forwarded alongside the message.
    pub fn detail(&self) -> Option<String> {
        match self {
            Error::InvalidJson(e) => Some(e.to_string()),
            Error::QuestionTooLong { length, max } => {
                Some(format!("{} characters, maximum is {}", length, max))
            }
            Error::Upstream { detail, .. } => Some(detail.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_400() {
        let invalid = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::InvalidJson(invalid).status_code(), 400);
        assert_eq!(Error::MissingQuestion.status_code(), 400);
        assert_eq!(Error::QuestionTooLong { length: 4001, max: 4000 }.status_code(), 400);
    }

    #[test]
    fn test_server_and_quota_errors() {
        assert_eq!(Error::MethodNotAllowed.status_code(), 405);
        assert_eq!(Error::RateLimited.status_code(), 429);
        assert_eq!(Error::MissingCredential.status_code(), 500);
        assert_eq!(Error::Internal("boom".to_string()).status_code(), 500);
        assert_eq!(Error::Internal("boom".to_string()).to_string(), "boom");
    }

    #[tokio::test]
    async fn test_panicked_task_is_internal_error() {
        let join_err = tokio::spawn(async { panic!("boom") }).await.unwrap_err();
        let err = Error::from(join_err);
        assert!(matches!(err, Error::Internal(_)));
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("panicked"));
    }

    #[test]
    fn test_upstream_status_passthrough() {
        let err = Error::Upstream { status: Some(503), detail: "overloaded".to_string() };
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.detail().as_deref(), Some("overloaded"));

        let err = Error::Upstream { status: None, detail: "connection reset".to_string() };
        assert_eq!(err.status_code(), 502);
    }
}
