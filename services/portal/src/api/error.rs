//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Keeps error bodies uniform across the portal's `/api` endpoints and maps
//! session-runtime failures onto HTTP statuses.
//!
//! # Key invariants and assumptions
//! - Error responses always carry a stable `code` and a human-readable
//!   `message`.
//! - Upstream and storage details are logged, never echoed to the caller.
use crate::api::types::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use pathexplorer_client::ClientError;

/// Structured API error returned by handlers.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use portal::api::error::ApiError;
/// use portal::api::types::ErrorResponse;
///
/// let err = ApiError {
///     status: StatusCode::UNAUTHORIZED,
///     body: ErrorResponse {
///         code: "unauthorized".to_string(),
///         message: "sign in first".to_string(),
///         request_id: None,
///     },
/// };
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

/// Build a 401 Unauthorized error.
///
/// # What it does
/// Returns an `ApiError` with code `unauthorized`.
///
/// # Errors
/// - Does not fail.
pub fn api_unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

/// Build a 401 error for a session that is no longer usable.
///
/// # What it does
/// Returns an `ApiError` with code `session_expired`; callers also expire
/// the session cookies.
///
/// # Errors
/// - Does not fail.
pub fn api_session_expired() -> ApiError {
    api_error(
        StatusCode::UNAUTHORIZED,
        "session_expired",
        "session expired, sign in again",
    )
}

/// Build a 403 Forbidden error.
///
/// # Errors
/// - Does not fail.
pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

/// Build a 400 Bad Request validation error.
///
/// # Errors
/// - Does not fail.
pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Build a 502 Bad Gateway error for identity-backend failures.
///
/// # What it does
/// Returns an `ApiError` with code `upstream_unavailable`. The caller may
/// retry.
///
/// # Errors
/// - Does not fail.
pub fn api_bad_gateway(message: &str) -> ApiError {
    api_error(StatusCode::BAD_GATEWAY, "upstream_unavailable", message)
}

/// Build a 500 Internal Server Error.
///
/// # Errors
/// - Does not fail.
pub fn api_internal_message(message: &str) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::AuthenticationFailure(message) => api_unauthorized(&message),
            ClientError::SessionExpired | ClientError::MalformedSession(_) => {
                api_session_expired()
            }
            ClientError::AuthorizationDenied { path } => {
                api_forbidden(&format!("access to {path} denied"))
            }
            ClientError::Rejected { status, message } if (400..500).contains(&status) => {
                api_validation_error(&message)
            }
            ClientError::Rejected { status, message } => {
                tracing::warn!(status, %message, "identity backend rejected request");
                api_bad_gateway("identity backend rejected the request")
            }
            ClientError::Network(detail) => {
                tracing::warn!(%detail, "identity backend unreachable");
                api_bad_gateway("identity backend unavailable")
            }
            ClientError::Storage(detail) => {
                tracing::error!(%detail, "portal storage error");
                api_internal_message("internal error")
            }
        }
    }
}
