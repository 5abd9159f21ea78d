//! Credential persistence mirrored between durable storage and cookies.
//!
//! # Purpose
//! Keeps the identity token and user record in the durable store (the
//! source of truth for the client) and mirrors both into the cookie jar so
//! the request-time gate sees the same identity.
//!
//! # Key invariants
//! - `clear` is idempotent and removes every copy.
//! - `restore` never yields a half session: both entries parse or neither
//!   is returned. Malformed entries are removed on the way out.
//! - An expired token is cleared during `restore` and reported as
//!   [`Restored::Expired`].
use crate::{
    ClientResult, CookieJar, KeyValueStorage, TOKEN_COOKIE, USER_COOKIE, UserRecord,
};
use pathexplorer_authz::is_token_expired;
use std::sync::Arc;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restored {
    Session(Session),
    Absent,
    Expired,
}

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    cookies: Arc<CookieJar>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, cookies: Arc<CookieJar>) -> Self {
        Self { storage, cookies }
    }

    pub fn cookies(&self) -> &Arc<CookieJar> {
        &self.cookies
    }

    pub async fn persist(&self, token: &str, user: &UserRecord) -> ClientResult<()> {
        self.storage.set(TOKEN_KEY, token).await?;
        self.cookies.set(TOKEN_COOKIE, token);
        self.persist_user(user).await
    }

    /// Rewrite the user record only; the token is left as is.
    pub async fn persist_user(&self, user: &UserRecord) -> ClientResult<()> {
        let encoded = serde_json::to_string(user)
            .map_err(|err| crate::ClientError::Storage(err.to_string()))?;
        self.storage.set(USER_KEY, &encoded).await?;
        self.cookies.set(USER_COOKIE, &encoded);
        Ok(())
    }

    pub async fn clear(&self) -> ClientResult<()> {
        self.cookies.remove(TOKEN_COOKIE);
        self.cookies.remove(USER_COOKIE);
        self.storage.remove(USER_KEY).await?;
        self.storage.remove(TOKEN_KEY).await
    }

    pub async fn token(&self) -> ClientResult<Option<String>> {
        self.storage.get(TOKEN_KEY).await
    }

    pub async fn restore(&self) -> ClientResult<Restored> {
        let token = self.storage.get(TOKEN_KEY).await?;
        let raw_user = self.storage.get(USER_KEY).await?;
        let (Some(token), Some(raw_user)) = (token, raw_user) else {
            return Ok(Restored::Absent);
        };
        let user = match serde_json::from_str::<UserRecord>(&raw_user) {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %err, "stored user record is malformed; clearing session");
                self.clear().await?;
                return Ok(Restored::Absent);
            }
        };
        if is_token_expired(&token) {
            tracing::info!(user = %user.id, "stored session token expired");
            self.clear().await?;
            return Ok(Restored::Expired);
        }
        // Cookies may have lapsed while storage survived; mirror them again.
        self.cookies.set(TOKEN_COOKIE, &token);
        self.cookies.set(USER_COOKIE, &raw_user);
        Ok(Restored::Session(Session { token, user }))
    }
}
