//! HTTP API request/response types.
//!
//! Payload shapes for the portal's `/api` surface and OpenAPI schema
//! generation. Profile updates keep the backend's Spanish field names.
use pathexplorer_authz::NavItem;
use pathexplorer_client::{ProfileUpdate, UserRecord};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SystemInfo {
    pub service: String,
    pub version: String,
    pub backend: String,
    pub gate_profile: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    /// Canonical role: `employee`, `manager` or `administrator`.
    pub role: String,
    pub position: Option<String>,
}

impl From<&UserRecord> for UserView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            position: user.position.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserView,
    /// Where the browser should go next.
    pub redirect: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct LogoutResponse {
    pub success: bool,
    pub redirect: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ProfileUpdateRequest {
    pub nombre: String,
    pub apellido: String,
    pub correo: String,
    pub cargo: String,
}

impl From<ProfileUpdateRequest> for ProfileUpdate {
    fn from(request: ProfileUpdateRequest) -> Self {
        Self {
            name: request.nombre,
            surname: request.apellido,
            email: request.correo,
            position: request.cargo,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NavLink {
    pub title: String,
    pub href: String,
}

impl From<NavItem> for NavLink {
    fn from(item: NavItem) -> Self {
        Self {
            title: item.title.to_string(),
            href: item.href.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: Option<UserView>,
    pub navigation: Vec<NavLink>,
    pub landing: String,
}
