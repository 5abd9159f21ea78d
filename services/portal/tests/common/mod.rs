#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, header};
use pathexplorer_authz::{GatePolicy, GateProfile, PermissionTable, Role, now_epoch_seconds};
use pathexplorer_client::{
    DemoAuthBackend, TOKEN_COOKIE, USER_COOKIE, UserRecord, demo_accounts, session_cookie,
};
use portal::app::{AppState, build_router};
use std::sync::Arc;

pub const SECRET: &[u8] = b"portal-tests";

pub type App = axum::routing::RouterIntoService<Body, ()>;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub async fn read_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

pub fn backend() -> Arc<DemoAuthBackend> {
    Arc::new(DemoAuthBackend::new(SECRET))
}

pub fn app(profile: GateProfile) -> App {
    app_with(profile, backend())
}

pub fn app_with(profile: GateProfile, backend: Arc<DemoAuthBackend>) -> App {
    let state = AppState {
        policy: Arc::new(GatePolicy::new(PermissionTable::canonical(), profile)),
        backend,
        backend_name: "demo",
        cookie_days: 7,
    };
    build_router(state).into_service()
}

pub fn demo_user(role: Role) -> UserRecord {
    demo_accounts()
        .into_iter()
        .map(|account| account.user)
        .find(|user| user.role == role)
        .expect("demo account for role")
}

/// `Cookie` header value for a session that expires at `exp`.
pub fn session_header(user: &UserRecord, exp: i64) -> String {
    let token = DemoAuthBackend::new(SECRET)
        .issue_token_expiring_at(user, exp)
        .expect("token");
    let user = serde_json::to_string(user).expect("user json");
    format!(
        "{}; {}",
        session_cookie(USER_COOKIE, &user, 7).encoded().stripped(),
        session_cookie(TOKEN_COOKIE, &token, 7).encoded().stripped()
    )
}

pub fn signed_in(role: Role) -> String {
    session_header(&demo_user(role), now_epoch_seconds() + 3600)
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn location(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Whether the response expires cookie `name`.
pub fn evicts(response: &axum::response::Response, name: &str) -> bool {
    set_cookies(response).iter().any(|cookie| {
        cookie.starts_with(&format!("{name}=;")) && cookie.contains("Max-Age=0")
    })
}

/// `name=value` pairs from the response's `Set-Cookie` headers, ready to be
/// sent back as a `Cookie` header.
pub fn cookie_header_from(response: &axum::response::Response) -> String {
    set_cookies(response)
        .iter()
        .filter_map(|cookie| cookie.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}
