//! Request-time route gate.
//!
//! # Purpose and responsibility
//! Runs before any page handler: reads the identity from the session
//! cookies, evaluates the route against the gate policy and answers with a
//! redirect when the page must not be served.
//!
//! # Key invariants and assumptions
//! - The API, docs and static assets are never gated; API handlers check the
//!   session themselves.
//! - A stale cookie pair counts as no identity and is expired in the same
//!   response.
use crate::app::AppState;
use crate::identity::{CookieIdentity, evict_session};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use pathexplorer_authz::{GateKind, evaluate, record_decision};

const UNGATED_PREFIXES: &[&str] = &["/api/", "/docs", "/static/"];
const UNGATED_PATHS: &[&str] = &["/api", "/favicon.ico"];

fn is_ungated(path: &str) -> bool {
    UNGATED_PATHS.contains(&path) || UNGATED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

pub async fn request_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if is_ungated(&path) {
        return next.run(request).await;
    }

    let identity = CookieIdentity::from_jar(&jar);
    let role = identity.role();
    let decision = evaluate(&state.policy, &path, role);
    record_decision(GateKind::Request, &path, role, decision);

    let response = match decision.redirect_target(&state.policy) {
        Some(target) => Redirect::temporary(target).into_response(),
        None => next.run(request).await,
    };
    if identity.is_stale() {
        tracing::debug!(%path, "expiring stale session cookies");
        (evict_session(jar), response).into_response()
    } else {
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_docs_and_assets_bypass_the_gate() {
        for path in [
            "/api",
            "/api/auth/login",
            "/api/openapi.json",
            "/docs",
            "/docs/index.html",
            "/static/app.css",
            "/favicon.ico",
        ] {
            assert!(is_ungated(path), "{path}");
        }
        for path in ["/", "/dashboard", "/apis", "/usuarios", "/login"] {
            assert!(!is_ungated(path), "{path}");
        }
    }
}
