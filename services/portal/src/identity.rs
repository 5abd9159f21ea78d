//! Identity carried by the `user`/`token` cookie pair.
//!
//! The request-time gate never calls the identity backend: it trusts the
//! cookies as far as the token's expiry claim and the user record's shape.
use axum_extra::extract::CookieJar;
use pathexplorer_authz::{Role, is_token_expired};
use pathexplorer_client::{TOKEN_COOKIE, USER_COOKIE, UserRecord, removal_cookie, session_cookie};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieIdentity {
    /// Neither cookie is present.
    Anonymous,
    Valid { user: UserRecord, token: String },
    /// Half a session, an expired or undecodable token, or a user record
    /// that does not parse.
    Stale,
}

impl CookieIdentity {
    pub fn from_jar(jar: &CookieJar) -> Self {
        let user = jar.get(USER_COOKIE).map(|cookie| cookie.value().to_string());
        let token = jar.get(TOKEN_COOKIE).map(|cookie| cookie.value().to_string());
        match (user, token) {
            (None, None) => CookieIdentity::Anonymous,
            (Some(user), Some(token)) => {
                if is_token_expired(&token) {
                    return CookieIdentity::Stale;
                }
                match serde_json::from_str::<UserRecord>(&user) {
                    Ok(user) => CookieIdentity::Valid { user, token },
                    Err(err) => {
                        tracing::debug!(error = %err, "unparseable user cookie");
                        CookieIdentity::Stale
                    }
                }
            }
            _ => CookieIdentity::Stale,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            CookieIdentity::Valid { user, .. } => Some(user.role),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            CookieIdentity::Valid { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            CookieIdentity::Valid { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, CookieIdentity::Stale)
    }
}

/// Add both session cookies to `jar`.
pub fn install_session(
    jar: CookieJar,
    token: &str,
    user: &UserRecord,
    days: i64,
) -> serde_json::Result<CookieJar> {
    let user = serde_json::to_string(user)?;
    Ok(jar
        .add(session_cookie(USER_COOKIE, &user, days))
        .add(session_cookie(TOKEN_COOKIE, token, days)))
}

/// Replace only the `user` cookie, keeping the current token.
pub fn refresh_user(jar: CookieJar, user: &UserRecord, days: i64) -> serde_json::Result<CookieJar> {
    let user = serde_json::to_string(user)?;
    Ok(jar.add(session_cookie(USER_COOKIE, &user, days)))
}

/// Expire both session cookies.
pub fn evict_session(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(USER_COOKIE))
        .add(removal_cookie(TOKEN_COOKIE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header};
    use jsonwebtoken::{EncodingKey, Header};
    use pathexplorer_authz::{IdentityClaims, now_epoch_seconds};

    fn user(role: Role) -> UserRecord {
        UserRecord {
            id: "7".to_string(),
            name: "Ana".to_string(),
            surname: "García".to_string(),
            email: "ana.garcia@accenture.com".to_string(),
            role,
            position: None,
        }
    }

    fn token(exp: i64) -> String {
        let claims = IdentityClaims {
            sub: Some("7".to_string()),
            role: Some("employee".to_string()),
            iat: None,
            exp,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(b"t"))
            .expect("token")
    }

    fn jar(cookie: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).expect("header"));
        CookieJar::from_headers(&headers)
    }

    fn encoded_user(user: &UserRecord) -> String {
        let json = serde_json::to_string(user).expect("json");
        session_cookie(USER_COOKIE, &json, 7)
            .encoded()
            .stripped()
            .to_string()
    }

    #[test]
    fn empty_jar_is_anonymous() {
        assert_eq!(
            CookieIdentity::from_jar(&CookieJar::new()),
            CookieIdentity::Anonymous
        );
    }

    #[test]
    fn valid_pair_yields_role() {
        let token = token(now_epoch_seconds() + 600);
        let header = format!("{}; token={token}", encoded_user(&user(Role::Employee)));
        let identity = CookieIdentity::from_jar(&jar(&header));
        assert_eq!(identity.role(), Some(Role::Employee));
        assert_eq!(identity.token(), Some(token.as_str()));
        assert_eq!(identity.user().map(|u| u.name.as_str()), Some("Ana"));
    }

    #[test]
    fn expired_token_is_stale() {
        let header = format!(
            "{}; token={}",
            encoded_user(&user(Role::Manager)),
            token(now_epoch_seconds() - 1)
        );
        assert!(CookieIdentity::from_jar(&jar(&header)).is_stale());
    }

    #[test]
    fn half_session_and_garbage_are_stale() {
        let token = token(now_epoch_seconds() + 600);
        assert!(CookieIdentity::from_jar(&jar(&format!("token={token}"))).is_stale());
        assert!(CookieIdentity::from_jar(&jar(&encoded_user(&user(Role::Manager)))).is_stale());
        assert!(
            CookieIdentity::from_jar(&jar(&format!("user=%7Bnope; token={token}"))).is_stale()
        );
        assert!(CookieIdentity::from_jar(&jar("user=x; token=not.a.jwt")).is_stale());
    }

    #[test]
    fn unknown_role_in_user_cookie_is_stale() {
        let token = token(now_epoch_seconds() + 600);
        let json = r#"{"id":"1","name":"X","email":"x@y.z","role":"root"}"#;
        let user = session_cookie(USER_COOKIE, json, 7).encoded().stripped().to_string();
        let identity = CookieIdentity::from_jar(&jar(&format!("{user}; token={token}")));
        assert!(identity.is_stale());
        assert_eq!(identity.role(), None);
    }

    #[test]
    fn install_and_evict_write_both_cookies() {
        let jar = install_session(CookieJar::new(), "abc", &user(Role::Manager), 7).expect("jar");
        assert_eq!(jar.get(TOKEN_COOKIE).map(|c| c.value().to_string()).as_deref(), Some("abc"));
        assert!(jar.get(USER_COOKIE).is_some());

        let jar = evict_session(jar);
        for name in [TOKEN_COOKIE, USER_COOKIE] {
            let cookie = jar.get(name).expect("removal cookie");
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(cookie::time::Duration::ZERO));
        }
    }
}
