//! Portal HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, layers the request-time gate and tracing over it,
//! and defines the shared state injected into handlers.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::gate;
use crate::observability;
use crate::pages;
use axum::Router;
use axum::middleware;
use pathexplorer_authz::GatePolicy;
use pathexplorer_client::AuthBackend;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<GatePolicy>,
    pub backend: Arc<dyn AuthBackend>,
    pub backend_name: &'static str,
    pub cookie_days: i64,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route("/", axum::routing::get(pages::landing))
        .route("/login", axum::routing::get(pages::login_page))
        .route("/register", axum::routing::get(pages::register_page))
        .route(
            "/forgot-password",
            axum::routing::get(pages::forgot_password_page),
        )
        .route("/unauthorized", axum::routing::get(pages::unauthorized_page))
        .route(
            "/restricted-access",
            axum::routing::get(pages::restricted_access_page),
        )
        .route(
            "/api/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/api/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/api/auth/login",
            axum::routing::post(api::session::login),
        )
        .route(
            "/api/auth/logout",
            axum::routing::post(api::session::logout),
        )
        .route(
            "/api/auth/profile",
            axum::routing::patch(api::session::update_profile),
        )
        .route(
            "/api/auth/session",
            axum::routing::get(api::session::current_session),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()),
        )
        .fallback(pages::app_shell)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::request_gate,
        ))
        .layer(trace_layer)
        .with_state(state)
}
