//! Gate evaluation shared by the request-time and render-time gates.
//!
//! # Purpose and responsibility
//! Turns `(path, identity)` into one of five decisions and maps each
//! decision to a redirect target. Both gates call [`evaluate`] so they can
//! never disagree on the same inputs.
//!
//! # Key invariants and assumptions
//! - Public paths are decided before identity is looked at.
//! - Missing identity always yields `Unauthenticated`, never `Denied`.
//! - Paths without a rule are let through so the router can 404 them.
//! - The login and denial targets are always public in the policy table, so
//!   a redirect can never loop back into the gate.
use crate::{AuthzError, AuthzResult, PermissionTable, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const LOGIN_ROUTE: &str = "/login";
pub const UNAUTHORIZED_ROUTE: &str = "/unauthorized";
pub const RESTRICTED_ACCESS_ROUTE: &str = "/restricted-access";

/// Which denial behaviour a deployment runs with.
///
/// `RestrictedAccess` is the alternate middleware policy: administrators are
/// revoked from `/dashboard` in the table itself and denials land on
/// `/restricted-access` instead of `/unauthorized`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateProfile {
    #[default]
    Standard,
    RestrictedAccess,
}

impl GateProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateProfile::Standard => "standard",
            GateProfile::RestrictedAccess => "restricted_access",
        }
    }
}

impl FromStr for GateProfile {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(GateProfile::Standard),
            "restricted_access" => Ok(GateProfile::RestrictedAccess),
            other => Err(AuthzError::InvalidTable(format!(
                "unknown gate profile: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePolicy {
    table: PermissionTable,
    profile: GateProfile,
    denied_redirect: &'static str,
}

impl GatePolicy {
    pub fn new(mut table: PermissionTable, profile: GateProfile) -> Self {
        let denied_redirect = match profile {
            GateProfile::Standard => UNAUTHORIZED_ROUTE,
            GateProfile::RestrictedAccess => {
                table.revoke("/dashboard", Role::Administrator);
                RESTRICTED_ACCESS_ROUTE
            }
        };
        // Redirect targets must never themselves be gated.
        for target in [LOGIN_ROUTE, denied_redirect] {
            let _ = table.add_public(target);
        }
        Self {
            table,
            profile,
            denied_redirect,
        }
    }

    pub fn standard() -> Self {
        Self::new(PermissionTable::canonical(), GateProfile::Standard)
    }

    pub fn restricted_access() -> Self {
        Self::new(PermissionTable::canonical(), GateProfile::RestrictedAccess)
    }

    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    pub fn profile(&self) -> GateProfile {
        self.profile
    }

    pub fn login_redirect(&self) -> &'static str {
        LOGIN_ROUTE
    }

    pub fn denied_redirect(&self) -> &'static str {
        self.denied_redirect
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateDecision {
    Public,
    Unauthenticated,
    NoRule,
    Allowed,
    Denied,
}

impl GateDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateDecision::Public => "public",
            GateDecision::Unauthenticated => "unauthenticated",
            GateDecision::NoRule => "no_rule",
            GateDecision::Allowed => "allowed",
            GateDecision::Denied => "denied",
        }
    }

    pub fn permits_render(&self) -> bool {
        matches!(
            self,
            GateDecision::Public | GateDecision::NoRule | GateDecision::Allowed
        )
    }

    pub fn redirect_target(&self, policy: &GatePolicy) -> Option<&'static str> {
        match self {
            GateDecision::Unauthenticated => Some(policy.login_redirect()),
            GateDecision::Denied => Some(policy.denied_redirect()),
            GateDecision::Public | GateDecision::NoRule | GateDecision::Allowed => None,
        }
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide a navigation attempt.
///
/// `role` is `None` whenever there is no valid identity: no session, an
/// expired token, or a user record that failed to parse.
pub fn evaluate(policy: &GatePolicy, path: &str, role: Option<Role>) -> GateDecision {
    let table = policy.table();
    if table.is_public(path) {
        return GateDecision::Public;
    }
    let Some(role) = role else {
        return GateDecision::Unauthenticated;
    };
    match table.allows(role, path) {
        None => GateDecision::NoRule,
        Some(true) => GateDecision::Allowed,
        Some(false) => GateDecision::Denied,
    }
}

/// Which gate produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    Request,
    Render,
}

impl GateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateKind::Request => "request",
            GateKind::Render => "render",
        }
    }
}

/// Log and count one gate decision.
pub fn record_decision(kind: GateKind, path: &str, role: Option<Role>, decision: GateDecision) {
    let role = role.map(|role| role.as_str()).unwrap_or("anonymous");
    match decision {
        GateDecision::Denied | GateDecision::Unauthenticated => tracing::info!(
            gate = kind.as_str(),
            path,
            role,
            decision = decision.as_str(),
            "gate redirected navigation"
        ),
        _ => tracing::debug!(
            gate = kind.as_str(),
            path,
            role,
            decision = decision.as_str(),
            "gate let navigation through"
        ),
    }
    metrics::counter!(
        "pathexplorer_gate_decisions_total",
        "gate" => kind.as_str(),
        "decision" => decision.as_str()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_routes_need_no_identity() {
        let policy = GatePolicy::standard();
        for path in ["/", "/login", "/register", "/forgot-password", "/unauthorized"] {
            assert_eq!(evaluate(&policy, path, None), GateDecision::Public, "{path}");
        }
    }

    #[test]
    fn anonymous_dashboard_goes_to_login() {
        let policy = GatePolicy::standard();
        let decision = evaluate(&policy, "/dashboard", None);
        assert_eq!(decision, GateDecision::Unauthenticated);
        assert_eq!(decision.redirect_target(&policy), Some("/login"));
    }

    #[test]
    fn employee_on_admin_route_is_denied() {
        let policy = GatePolicy::standard();
        let decision = evaluate(&policy, "/usuarios", Some(Role::Employee));
        assert_eq!(decision, GateDecision::Denied);
        assert_eq!(decision.redirect_target(&policy), Some("/unauthorized"));

        let alternate = GatePolicy::restricted_access();
        let decision = evaluate(&alternate, "/usuarios", Some(Role::Employee));
        assert_eq!(decision.redirect_target(&alternate), Some("/restricted-access"));
    }

    #[test]
    fn unknown_routes_are_let_through() {
        let policy = GatePolicy::standard();
        let decision = evaluate(&policy, "/no-existe", Some(Role::Manager));
        assert_eq!(decision, GateDecision::NoRule);
        assert!(decision.permits_render());
        assert_eq!(decision.redirect_target(&policy), None);
    }

    #[test]
    fn unknown_routes_still_require_identity() {
        let policy = GatePolicy::standard();
        assert_eq!(
            evaluate(&policy, "/no-existe", None),
            GateDecision::Unauthenticated
        );
    }

    #[test]
    fn administrator_dashboard_depends_on_profile() {
        let standard = GatePolicy::standard();
        assert_eq!(
            evaluate(&standard, "/dashboard", Some(Role::Administrator)),
            GateDecision::Allowed
        );

        let alternate = GatePolicy::restricted_access();
        let decision = evaluate(&alternate, "/dashboard", Some(Role::Administrator));
        assert_eq!(decision, GateDecision::Denied);
        assert_eq!(decision.redirect_target(&alternate), Some("/restricted-access"));
        assert_eq!(
            evaluate(&alternate, "/dashboard", Some(Role::Manager)),
            GateDecision::Allowed
        );
    }

    #[test]
    fn decisions_follow_the_table_for_every_role_and_route() {
        let policy = GatePolicy::standard();
        let table = policy.table();
        let paths: Vec<String> = table
            .exact_routes()
            .map(|(path, _)| path.to_string())
            .chain(["/proyectos/9".to_string(), "/cursos/intro".to_string()])
            .collect();
        for path in &paths {
            for role in Role::ALL {
                let expected = if table.allows(role, path).expect("rule") {
                    GateDecision::Allowed
                } else {
                    GateDecision::Denied
                };
                assert_eq!(evaluate(&policy, path, Some(role)), expected, "{role} {path}");
            }
        }
    }

    #[test]
    fn redirect_targets_are_public() {
        for policy in [GatePolicy::standard(), GatePolicy::restricted_access()] {
            assert!(policy.table().is_public(policy.login_redirect()));
            assert!(policy.table().is_public(policy.denied_redirect()));
        }
        let table = PermissionTable::new()
            .with_route("/dashboard", &[Role::Manager])
            .expect("route");
        let policy = GatePolicy::new(table, GateProfile::Standard);
        assert_eq!(evaluate(&policy, "/login", None), GateDecision::Public);
        assert_eq!(evaluate(&policy, "/unauthorized", None), GateDecision::Public);
    }

    #[test]
    fn parses_profiles() {
        assert_eq!("standard".parse::<GateProfile>().ok(), Some(GateProfile::Standard));
        assert_eq!(
            "restricted-access".parse::<GateProfile>().ok(),
            Some(GateProfile::RestrictedAccess)
        );
        assert!("lenient".parse::<GateProfile>().is_err());
        for profile in [GateProfile::Standard, GateProfile::RestrictedAccess] {
            assert_eq!(profile.as_str().parse::<GateProfile>().ok(), Some(profile));
        }
    }

    #[test]
    fn recording_does_not_panic_without_a_recorder() {
        record_decision(GateKind::Request, "/usuarios", Some(Role::Employee), GateDecision::Denied);
        record_decision(GateKind::Render, "/login", None, GateDecision::Public);
    }
}
