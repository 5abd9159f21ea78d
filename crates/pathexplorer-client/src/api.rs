//! Shared HTTP client for the PathExplorer backend.
//!
//! # Purpose
//! Every backend call goes through [`ApiClient`], so a `401` from any
//! endpoint is seen in one place and broadcast as
//! [`SessionEvent::Unauthorized`] to whoever owns the session.
//!
//! # Response shape
//! Endpoints answer with `{success, message, ...payload}`; the payload
//! fields are flattened into `T` of [`ApiEnvelope<T>`].
use crate::{ClientConfig, ClientError, ClientResult};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The backend answered `401` for a request to `path`.
    Unauthorized { path: String },
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sender half of the unauthorized-event channel, for session owners
    /// that subscribe later.
    pub fn events(&self) -> broadcast::Sender<SessionEvent> {
        self.events.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> ClientResult<ApiEnvelope<T>> {
        self.request::<(), T>(Method::GET, path, None, token).await
    }

    pub async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> ClientResult<ApiEnvelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body), token).await
    }

    pub async fn patch<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> ClientResult<ApiEnvelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, path, Some(body), token).await
    }

    /// Send one request and decode the envelope.
    ///
    /// # Errors
    /// - `SessionExpired` on `401`, after broadcasting the event.
    /// - `AuthorizationDenied` on `403`.
    /// - `Rejected` for any other non-success status or `success: false`.
    /// - `Network` when the request fails or the body does not decode.
    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> ClientResult<ApiEnvelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%method, path = %path, status = status.as_u16(), "backend response");

        match status {
            StatusCode::UNAUTHORIZED => {
                let _ = self.events.send(SessionEvent::Unauthorized { path });
                return Err(ClientError::SessionExpired);
            }
            StatusCode::FORBIDDEN => return Err(ClientError::AuthorizationDenied { path }),
            _ => {}
        }

        let bytes = response.bytes().await?;
        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) if status.is_success() => {
                return Err(ClientError::Network(format!("decode response: {err}")));
            }
            Err(_) => Value::Null,
        };
        let success = value
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !status.is_success() || !success {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_value(value)
            .map_err(|err| ClientError::Network(format!("decode response: {err}")))
    }
}
