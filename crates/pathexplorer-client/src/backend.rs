//! Identity backends: the remote PathExplorer API and an in-memory demo.
use crate::{ApiClient, ClientError, ClientResult, ProfileUpdate, Session, UserRecord};
use async_trait::async_trait;
use dashmap::DashMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pathexplorer_authz::{IdentityClaims, Role, now_epoch_seconds};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_DEMO_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> ClientResult<Session>;
    async fn update_profile(&self, token: &str, update: &ProfileUpdate)
    -> ClientResult<UserRecord>;
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<UserRecord>,
}

#[derive(Debug, Deserialize)]
struct UpdatePayload {
    #[serde(default)]
    user: Option<UserRecord>,
}

/// Talks to `POST /auth/login` and `PATCH /auth/update`.
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    api: Arc<ApiClient>,
}

impl HttpAuthBackend {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let body = json!({ "email": email, "password": password });
        let envelope = match self
            .api
            .post::<_, LoginPayload>("/auth/login", &body, None)
            .await
        {
            Ok(envelope) => envelope,
            Err(ClientError::SessionExpired | ClientError::AuthorizationDenied { .. }) => {
                return Err(ClientError::AuthenticationFailure(
                    "Autenticación fallida".to_string(),
                ));
            }
            Err(ClientError::Rejected { message, .. }) => {
                return Err(ClientError::AuthenticationFailure(message));
            }
            Err(err) => return Err(err),
        };
        match (envelope.payload.token, envelope.payload.user) {
            (Some(token), Some(user)) if !token.is_empty() => Ok(Session { token, user }),
            _ => Err(ClientError::AuthenticationFailure(
                envelope
                    .message
                    .unwrap_or_else(|| "Credenciales inválidas".to_string()),
            )),
        }
    }

    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> ClientResult<UserRecord> {
        let envelope = self
            .api
            .patch::<_, UpdatePayload>("/auth/update", update, Some(token))
            .await?;
        envelope.payload.user.ok_or_else(|| ClientError::Rejected {
            status: 200,
            message: envelope
                .message
                .unwrap_or_else(|| "Error updating profile".to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoAccount {
    pub password: String,
    pub user: UserRecord,
}

/// Built-in accounts for running the dashboard without a backend.
pub fn demo_accounts() -> Vec<DemoAccount> {
    let account = |id: &str, name: &str, surname: &str, email: &str, password: &str, role| {
        DemoAccount {
            password: password.to_string(),
            user: UserRecord {
                id: id.to_string(),
                name: name.to_string(),
                surname: surname.to_string(),
                email: email.to_string(),
                role,
                position: None,
            },
        }
    };
    vec![
        account(
            "1",
            "Juan",
            "Díaz",
            "juan.diaz@accenture.com",
            "manager123",
            Role::Manager,
        ),
        account(
            "2",
            "Ana",
            "García",
            "ana.garcia@accenture.com",
            "employee123",
            Role::Employee,
        ),
        account(
            "3",
            "Carlos",
            "Rodriguez",
            "admin@accenture.com",
            "admin123",
            Role::Administrator,
        ),
    ]
}

/// In-memory identity backend issuing HS256 tokens.
pub struct DemoAuthBackend {
    accounts: DashMap<String, DemoAccount>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl: Duration,
}

impl DemoAuthBackend {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_accounts(secret, demo_accounts())
    }

    pub fn with_accounts(secret: &[u8], accounts: Vec<DemoAccount>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|account| (account.user.id.clone(), account))
                .collect(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            token_ttl: DEFAULT_DEMO_TOKEN_TTL,
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn issue_token(&self, user: &UserRecord) -> ClientResult<String> {
        let ttl = i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX);
        self.issue_token_expiring_at(user, now_epoch_seconds().saturating_add(ttl))
    }

    pub fn issue_token_expiring_at(&self, user: &UserRecord, exp: i64) -> ClientResult<String> {
        let claims = IdentityClaims {
            sub: Some(user.id.clone()),
            role: Some(user.role.as_str().to_string()),
            iat: Some(now_epoch_seconds()),
            exp,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| ClientError::Storage(format!("sign demo token: {err}")))
    }

    /// Check signature and expiry; expiry is strict, with no leeway.
    pub fn verify(&self, token: &str) -> ClientResult<IdentityClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        match jsonwebtoken::decode::<IdentityClaims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => {
                Err(ClientError::SessionExpired)
            }
            Err(err) => Err(ClientError::MalformedSession(err.to_string())),
        }
    }
}

#[async_trait]
impl AuthBackend for DemoAuthBackend {
    async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let user = self
            .accounts
            .iter()
            .find(|entry| {
                entry.user.email.eq_ignore_ascii_case(email.trim()) && entry.password == password
            })
            .map(|entry| entry.user.clone())
            .ok_or_else(|| ClientError::AuthenticationFailure("Credenciales inválidas".to_string()))?;
        let token = self.issue_token(&user)?;
        tracing::info!(user = %user.id, role = %user.role, "demo login");
        Ok(Session { token, user })
    }

    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> ClientResult<UserRecord> {
        let claims = match self.verify(token) {
            Ok(claims) => claims,
            Err(ClientError::MalformedSession(_)) => return Err(ClientError::SessionExpired),
            Err(err) => return Err(err),
        };
        if update.name.trim().is_empty() || !update.email.contains('@') {
            return Err(ClientError::Rejected {
                status: 400,
                message: "nombre y correo son obligatorios".to_string(),
            });
        }
        let sub = claims.sub.unwrap_or_default();
        let mut account = self
            .accounts
            .get_mut(&sub)
            .ok_or(ClientError::SessionExpired)?;
        account.user.apply(update);
        Ok(account.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientConfig;
    use axum::extract::Json as JsonBody;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{patch, post};
    use axum::{Json, Router};
    use pathexplorer_authz::{decode_claims, is_token_expired};
    use serde_json::Value;

    const SECRET: &[u8] = b"demo-secret";

    fn update() -> ProfileUpdate {
        ProfileUpdate {
            name: "Ana María".to_string(),
            surname: "García".to_string(),
            email: "ana.garcia@accenture.com".to_string(),
            position: "Analista Sr".to_string(),
        }
    }

    #[tokio::test]
    async fn demo_login_issues_unexpired_token_with_role() -> ClientResult<()> {
        let backend = DemoAuthBackend::new(SECRET);
        let session = backend.login("Juan.Diaz@accenture.com", "manager123").await?;
        assert_eq!(session.user.role, Role::Manager);
        assert!(!is_token_expired(&session.token));
        let claims = decode_claims(&session.token).expect("claims");
        assert_eq!(claims.role(), Some(Role::Manager));
        assert_eq!(claims.sub.as_deref(), Some("1"));
        Ok(())
    }

    #[test]
    fn unbounded_ttl_saturates_expiry() -> ClientResult<()> {
        let backend = DemoAuthBackend::new(SECRET).with_token_ttl(Duration::MAX);
        let user = demo_accounts().remove(0).user;
        let token = backend.issue_token(&user)?;
        let claims = decode_claims(&token).expect("claims");
        assert_eq!(claims.exp, i64::MAX);
        assert!(!is_token_expired(&token));
        Ok(())
    }

    #[tokio::test]
    async fn demo_login_rejects_bad_credentials() {
        let backend = DemoAuthBackend::new(SECRET);
        let err = backend
            .login("admin@accenture.com", "wrong")
            .await
            .expect_err("bad password");
        assert!(matches!(err, ClientError::AuthenticationFailure(_)));
    }

    #[tokio::test]
    async fn demo_update_requires_live_token() -> ClientResult<()> {
        let backend = DemoAuthBackend::new(SECRET);
        let session = backend.login("ana.garcia@accenture.com", "employee123").await?;

        let user = backend.update_profile(&session.token, &update()).await?;
        assert_eq!(user.name, "Ana María");
        assert_eq!(user.position.as_deref(), Some("Analista Sr"));

        let expired = backend.issue_token_expiring_at(&session.user, now_epoch_seconds() - 5)?;
        assert!(matches!(
            backend.update_profile(&expired, &update()).await,
            Err(ClientError::SessionExpired)
        ));
        let foreign = DemoAuthBackend::new(b"other").issue_token(&session.user)?;
        assert!(matches!(
            backend.update_profile(&foreign, &update()).await,
            Err(ClientError::SessionExpired)
        ));
        Ok(())
    }

    async fn login_handler(JsonBody(body): JsonBody<Value>) -> (StatusCode, Json<Value>) {
        if body["password"] == "secret" {
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "token": "a.b.c",
                    "user": {
                        "id": 5, "nombre": "Juan", "apellido": "Díaz",
                        "correo": "juan.diaz@accenture.com", "role": "manager"
                    }
                })),
            )
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"success": false, "message": "Credenciales inválidas"})),
            )
        }
    }

    async fn update_handler(headers: HeaderMap, JsonBody(body): JsonBody<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer a.b.c") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"success": false})));
        }
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "user": {
                    "id": 5, "nombre": body["nombre"], "apellido": body["apellido"],
                    "correo": body["correo"], "role": "Manager", "cargo": body["cargo"]
                }
            })),
        )
    }

    async fn http_backend() -> ClientResult<HttpAuthBackend> {
        let app = Router::new()
            .route("/api/auth/login", post(login_handler))
            .route("/api/auth/update", patch(update_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let config = ClientConfig {
            api_url: format!("http://{addr}/api"),
            ..ClientConfig::default()
        };
        Ok(HttpAuthBackend::new(Arc::new(ApiClient::new(&config)?)))
    }

    #[tokio::test]
    async fn http_login_and_update() -> ClientResult<()> {
        let backend = http_backend().await?;
        let session = backend.login("juan.diaz@accenture.com", "secret").await?;
        assert_eq!(session.token, "a.b.c");
        assert_eq!(session.user.id, "5");
        assert_eq!(session.user.role, Role::Manager);

        let user = backend.update_profile(&session.token, &update()).await?;
        assert_eq!(user.email, "ana.garcia@accenture.com");
        assert_eq!(user.position.as_deref(), Some("Analista Sr"));

        assert!(matches!(
            backend.update_profile("stale", &update()).await,
            Err(ClientError::SessionExpired)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn http_login_failure_is_authentication_failure() -> ClientResult<()> {
        let backend = http_backend().await?;
        let err = backend
            .login("juan.diaz@accenture.com", "nope")
            .await
            .expect_err("401");
        assert!(matches!(err, ClientError::AuthenticationFailure(_)));
        Ok(())
    }
}
