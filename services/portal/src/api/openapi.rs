//! OpenAPI document for the portal's `/api` surface.
use crate::api::types::{
    ErrorResponse, HealthStatus, LoginRequest, LoginResponse, LogoutResponse, NavLink,
    ProfileResponse, ProfileUpdateRequest, SessionResponse, SystemInfo, UserView,
};
use crate::api::{session, system};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pathexplorer-portal",
        version = "v1",
        description = "PathExplorer portal session API"
    ),
    paths(
        system::system_info,
        system::system_health,
        session::login,
        session::logout,
        session::update_profile,
        session::current_session
    ),
    components(schemas(
        SystemInfo,
        HealthStatus,
        ErrorResponse,
        LoginRequest,
        LoginResponse,
        LogoutResponse,
        ProfileUpdateRequest,
        ProfileResponse,
        UserView,
        NavLink,
        SessionResponse
    )),
    tags(
        (name = "system", description = "Health and service metadata"),
        (name = "auth", description = "Sign-in, sign-out and profile")
    )
)]
pub struct ApiDoc;
