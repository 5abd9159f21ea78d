//! Session endpoints: login, logout, profile update and session lookup.
//!
//! # Purpose and responsibility
//! Brokers the identity backend for browsers and owns the `user`/`token`
//! cookie pair that the request-time gate reads.
//!
//! # Key invariants and assumptions
//! - Cookies are only installed for a token that is not already expired.
//! - A stale cookie pair is always expired in the same response that
//!   reports it.
//! - Logout is idempotent: it expires both cookies whatever the jar holds.
use crate::api::error::{
    ApiError, api_internal_message, api_session_expired, api_unauthorized, api_validation_error,
};
use crate::api::types::{
    ErrorResponse, LoginRequest, LoginResponse, LogoutResponse, NavLink, ProfileResponse, ProfileUpdateRequest,
    SessionResponse, UserView,
};
use crate::app::AppState;
use crate::identity::{CookieIdentity, evict_session, install_session, refresh_user};
use crate::observability::LOGINS_METRIC;
use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use pathexplorer_authz::{LOGIN_ROUTE, is_token_expired, landing_route, navigation_for};
use pathexplorer_client::{ClientError, ProfileUpdate};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; session cookies set", body = LoginResponse),
        (status = 400, description = "Missing email or password", body = ErrorResponse),
        (status = 401, description = "Bad credentials", body = ErrorResponse),
        (status = 502, description = "Identity backend unavailable", body = ErrorResponse)
    )
)]
/// Authenticate against the identity backend and set the session cookies.
///
/// # What it does
/// Forwards the credentials, checks that the issued token is still valid,
/// writes the `user` and `token` cookies and returns the role's landing
/// route.
///
/// # Errors
/// - 400 for blank credentials.
/// - 401 for rejected credentials or an already-expired token.
/// - 502 when the backend cannot be reached.
pub(crate) async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(api_validation_error("email and password are required"));
    }

    let session = match state.backend.login(email, &request.password).await {
        Ok(session) => session,
        Err(err) => {
            tracing::info!(error = %err, "portal login failed");
            metrics::counter!(LOGINS_METRIC, "outcome" => "failure").increment(1);
            return Err(err.into());
        }
    };
    if is_token_expired(&session.token) {
        tracing::warn!(user = %session.user.id, "identity backend issued an expired token");
        metrics::counter!(LOGINS_METRIC, "outcome" => "expired").increment(1);
        return Err(ClientError::SessionExpired.into());
    }

    let jar = install_session(jar, &session.token, &session.user, state.cookie_days)
        .map_err(|err| {
            tracing::error!(error = %err, "failed to encode user cookie");
            api_internal_message("failed to create session")
        })?;
    let role = session.user.role;
    tracing::info!(user = %session.user.id, %role, "portal login");
    metrics::counter!(LOGINS_METRIC, "outcome" => "success").increment(1);
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user: UserView::from(&session.user),
            redirect: landing_route(Some(role)).to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Session cookies expired", body = LogoutResponse)
    )
)]
/// Expire both session cookies and point the browser at `/login`.
pub(crate) async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    if let CookieIdentity::Valid { user, .. } = CookieIdentity::from_jar(&jar) {
        tracing::info!(user = %user.id, "portal logout");
    }
    (
        evict_session(jar),
        Json(LogoutResponse {
            success: true,
            redirect: LOGIN_ROUTE.to_string(),
        }),
    )
}

#[utoipa::path(
    patch,
    path = "/api/auth/profile",
    tag = "auth",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated; user cookie refreshed", body = ProfileResponse),
        (status = 400, description = "Update rejected", body = ErrorResponse),
        (status = 401, description = "No session or session expired", body = ErrorResponse),
        (status = 502, description = "Identity backend unavailable", body = ErrorResponse)
    )
)]
/// Update the signed-in user's profile.
///
/// # What it does
/// Requires an unexpired session cookie pair, forwards the update with the
/// session token and rewrites only the `user` cookie.
///
/// # Errors
/// - 401 `unauthorized` without a session.
/// - 401 `session_expired` for a stale session or a backend that no longer
///   accepts the token; both cookies are expired.
/// - 400 or 502 per the backend's answer.
pub(crate) async fn update_profile(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<(CookieJar, Json<ProfileResponse>), (CookieJar, ApiError)> {
    let token = match CookieIdentity::from_jar(&jar) {
        CookieIdentity::Valid { token, .. } => token,
        CookieIdentity::Stale => return Err((evict_session(jar), api_session_expired())),
        CookieIdentity::Anonymous => return Err((jar, api_unauthorized("sign in first"))),
    };

    let update = ProfileUpdate::from(request);
    match state.backend.update_profile(&token, &update).await {
        Ok(user) => {
            let jar = match refresh_user(jar.clone(), &user, state.cookie_days) {
                Ok(jar) => jar,
                Err(err) => {
                    tracing::error!(error = %err, "failed to encode user cookie");
                    return Err((jar, api_internal_message("failed to store profile")));
                }
            };
            tracing::info!(user = %user.id, "profile updated");
            Ok((
                jar,
                Json(ProfileResponse {
                    success: true,
                    user: UserView::from(&user),
                }),
            ))
        }
        Err(err @ (ClientError::SessionExpired | ClientError::MalformedSession(_))) => {
            tracing::info!(error = %err, "profile update ended the session");
            Err((evict_session(jar), err.into()))
        }
        Err(err) => Err((jar, err.into())),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Current cookie identity and navigation", body = SessionResponse)
    )
)]
/// Describe the cookie session: who is signed in, their menu and landing
/// route. A stale pair is reported as signed out and expired.
pub(crate) async fn current_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SessionResponse>) {
    let identity = CookieIdentity::from_jar(&jar);
    let jar = if identity.is_stale() {
        evict_session(jar)
    } else {
        jar
    };
    let navigation = identity
        .role()
        .map(|role| {
            navigation_for(role, state.policy.table())
                .into_iter()
                .map(NavLink::from)
                .collect()
        })
        .unwrap_or_default();
    (
        jar,
        Json(SessionResponse {
            authenticated: identity.user().is_some(),
            user: identity.user().map(UserView::from),
            navigation,
            landing: landing_route(identity.role()).to_string(),
        }),
    )
}
