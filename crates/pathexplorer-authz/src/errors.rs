use crate::allowlist::PolicyConflict;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("invalid route pattern: {0}")]
    InvalidRoute(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("invalid permission table: {0}")]
    InvalidTable(String),
    #[error("route policy conflicts with allow-lists: {}", render_conflicts(.0))]
    PolicyConflict(Vec<PolicyConflict>),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

fn render_conflicts(conflicts: &[PolicyConflict]) -> String {
    conflicts
        .iter()
        .map(|conflict| conflict.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
