use thiserror::Error;

/// Failures surfaced by the session runtime.
///
/// Only `AuthenticationFailure`, `Rejected` and `Network` are meant for the
/// user; the session variants end in a forced logout and a redirect.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),
    #[error("session expired")]
    SessionExpired,
    #[error("access to {path} denied")]
    AuthorizationDenied { path: String },
    #[error("malformed session: {0}")]
    MalformedSession(String),
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Whether the caller may offer the user a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
