//! Identity-token inspection without network access.
//!
//! # Purpose
//! Decodes the claim set of a signed identity token so gates and the session
//! runtime can decide whether the token is still usable.
//!
//! # Key invariants
//! - The signature is not checked here; the issuing backend remains the
//!   authority on authenticity. Only expiry is decided locally.
//! - Anything that does not decode into a claim set with an `exp` claim is
//!   reported as expired (fail closed).
use crate::{AuthzError, AuthzResult, Role};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Decoded identity-token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    #[serde(default, deserialize_with = "string_or_number")]
    pub sub: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    pub exp: i64,
}

impl IdentityClaims {
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::normalize)
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp < now
    }
}

/// Decode the payload segment of a compact JWS.
///
/// # Errors
/// - `InvalidToken` when the token does not have three segments, the payload
///   is not base64url, or the JSON lacks a numeric `exp` claim.
pub fn decode_claims(token: &str) -> AuthzResult<IdentityClaims> {
    let mut parts = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthzError::InvalidToken("token format".to_string()));
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| AuthzError::InvalidToken("token payload".to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| AuthzError::InvalidToken(format!("token payload: {err}")))
}

pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, now_epoch_seconds())
}

/// Expired when the token cannot be decoded or `exp < now`.
pub fn is_token_expired_at(token: &str, now: i64) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.is_expired_at(now),
        Err(err) => {
            tracing::debug!(error = %err, "undecodable identity token treated as expired");
            true
        }
    }
}

pub fn now_epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    // Backends issue numeric person ids as `sub`; keep them as text.
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) => Some(value),
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    })
}
