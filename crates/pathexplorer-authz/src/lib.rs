//! PathExplorer route-authorization primitives shared by the portal and clients.
//!
//! # Purpose
//! Centralizes the role model, identity-token inspection, the authoritative
//! route permission table, and the gate evaluation used at request time and
//! at render time.
//!
//! # How it fits
//! The portal service evaluates gates from cookies before a page is served,
//! while client runtimes evaluate the same gates from their session state
//! after mount. Both call [`evaluate`] against one [`GatePolicy`].
//!
//! # Key invariants
//! - Roles are normalized once at the boundary; comparisons only ever see
//!   [`Role`] values.
//! - Tokens that cannot be decoded are treated as expired.
//! - A path with no table entry is allowed through (`NoRule`).
//!
//! # Examples
//! ```rust
//! use pathexplorer_authz::{GateDecision, GatePolicy, Role, evaluate};
//!
//! let policy = GatePolicy::standard();
//! let decision = evaluate(&policy, "/usuarios", Some(Role::Employee));
//! assert_eq!(decision, GateDecision::Denied);
//! assert_eq!(decision.redirect_target(&policy), Some("/unauthorized"));
//! ```

mod allowlist;
mod claims;
mod errors;
mod gate;
mod navigation;
mod role;
mod route;
mod table;

pub use allowlist::{PolicyConflict, RoleAllowList, find_conflicts};
pub use claims::{
    IdentityClaims, decode_claims, is_token_expired, is_token_expired_at, now_epoch_seconds,
};
pub use errors::{AuthzError, AuthzResult};
pub use gate::{
    GateDecision, GateKind, GatePolicy, GateProfile, LOGIN_ROUTE, RESTRICTED_ACCESS_ROUTE,
    UNAUTHORIZED_ROUTE, evaluate, record_decision,
};
pub use navigation::{NavItem, landing_route, navigation_for};
pub use role::Role;
pub use route::{RoutePattern, normalize_path};
pub use table::PermissionTable;
