//! System/health API handlers.
//!
//! Both endpoints are read-only and answered from in-memory state; they sit
//! outside the route gate so probes never need a session.
use crate::api::types::{HealthStatus, SystemInfo};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/api/system/info",
    tag = "system",
    responses(
        (status = 200, description = "Portal identity and gate profile", body = SystemInfo)
    )
)]
/// Return the portal version, identity backend and gate profile.
///
/// # Errors
/// - Does not return errors.
pub(crate) async fn system_info(State(state): State<AppState>) -> Json<SystemInfo> {
    Json(SystemInfo {
        service: "pathexplorer-portal".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend_name.to_string(),
        gate_profile: state.policy.profile().as_str().to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/system/health",
    tag = "system",
    responses(
        (status = 200, description = "Portal health", body = HealthStatus)
    )
)]
/// Liveness probe.
pub(crate) async fn system_health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
    })
}
