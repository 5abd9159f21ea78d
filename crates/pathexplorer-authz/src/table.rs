//! The authoritative route → roles permission table.
//!
//! # Purpose and responsibility
//! Holds the single route policy consumed by the request-time gate, the
//! render-time gate and the navigation menu.
//!
//! # Key invariants and assumptions
//! - Lookups try exact paths first, then patterns in declaration order.
//! - The table is built once at startup and never mutated while serving.
//! - Public routes bypass identity checks entirely.
use crate::{AuthzError, AuthzResult, Role, RoutePattern, normalize_path};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

const ALL_ROLES: &[Role] = &[Role::Employee, Role::Manager, Role::Administrator];

pub(crate) const CANONICAL_PUBLIC_ROUTES: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/forgot-password",
    "/unauthorized",
    "/restricted-access",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    exact: BTreeMap<String, BTreeSet<Role>>,
    patterns: Vec<(RoutePattern, BTreeSet<Role>)>,
    public: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
struct TableDocument {
    #[serde(default)]
    public: Option<Vec<String>>,
    #[serde(default)]
    routes: Vec<RouteEntry>,
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    path: String,
    roles: Vec<Role>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The dashboard's route policy.
    pub fn canonical() -> Self {
        let mut table = Self::new();
        for path in CANONICAL_PUBLIC_ROUTES {
            table.public.insert((*path).to_string());
        }
        let rules: &[(&str, &[Role])] = &[
            ("/dashboard", ALL_ROLES),
            ("/perfil", ALL_ROLES),
            ("/configuracion", ALL_ROLES),
            ("/proyecto-actual", &[Role::Employee]),
            ("/cursos", &[Role::Employee]),
            ("/mi-desempeno", &[Role::Employee]),
            ("/proyectos", &[Role::Manager]),
            ("/equipo", &[Role::Manager]),
            ("/analitica", &[Role::Manager, Role::Employee]),
            ("/usuarios", &[Role::Administrator]),
            ("/autorizaciones", &[Role::Administrator]),
            ("/departamentos", &[Role::Administrator]),
            ("/proyectos/:id", &[Role::Manager]),
            ("/cursos/*", &[Role::Employee]),
        ];
        for (path, roles) in rules {
            // Static rules above are known to parse.
            if let Ok(pattern) = RoutePattern::parse(path) {
                table.insert(pattern, roles.iter().copied().collect());
            }
        }
        table
    }

    /// Build a table from YAML.
    ///
    /// ```yaml
    /// public: ["/", "/login"]
    /// routes:
    ///   - path: /dashboard
    ///     roles: [empleado, manager, administrador]
    ///   - path: /proyectos/:id
    ///     roles: [manager]
    /// ```
    ///
    /// When `public` is omitted the canonical public routes are used.
    pub fn from_yaml_str(contents: &str) -> AuthzResult<Self> {
        let document: TableDocument = serde_yaml::from_str(contents)
            .map_err(|err| AuthzError::InvalidTable(err.to_string()))?;
        let mut table = Self::new();
        match document.public {
            Some(public) => {
                for path in public {
                    table.add_public(&path)?;
                }
            }
            None => {
                for path in CANONICAL_PUBLIC_ROUTES {
                    table.public.insert((*path).to_string());
                }
            }
        }
        for entry in document.routes {
            let pattern = RoutePattern::parse(&entry.path)?;
            if entry.roles.is_empty() {
                return Err(AuthzError::InvalidTable(format!(
                    "route {} grants no roles",
                    entry.path
                )));
            }
            table.insert(pattern, entry.roles.into_iter().collect());
        }
        Ok(table)
    }

    pub fn with_route(mut self, pattern: &str, roles: &[Role]) -> AuthzResult<Self> {
        let pattern = RoutePattern::parse(pattern)?;
        self.insert(pattern, roles.iter().copied().collect());
        Ok(self)
    }

    pub fn add_public(&mut self, path: &str) -> AuthzResult<()> {
        match RoutePattern::parse(path)? {
            RoutePattern::Exact(path) => {
                self.public.insert(path);
                Ok(())
            }
            RoutePattern::Param(path) => Err(AuthzError::InvalidRoute(format!(
                "public routes must be exact: {path}"
            ))),
        }
    }

    /// Remove `role` from an exact route's allowed set.
    pub fn revoke(&mut self, path: &str, role: Role) {
        if let Some(roles) = self.exact.get_mut(&normalize_path(path)) {
            roles.remove(&role);
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public.contains(&normalize_path(path))
    }

    /// Allowed roles for `path`, exact match first, then patterns in order.
    pub fn lookup(&self, path: &str) -> Option<&BTreeSet<Role>> {
        let path = normalize_path(path);
        if let Some(roles) = self.exact.get(&path) {
            return Some(roles);
        }
        self.patterns
            .iter()
            .find(|(pattern, _)| pattern.matches(&path))
            .map(|(_, roles)| roles)
    }

    /// `None` when the table has no rule for `path`.
    pub fn allows(&self, role: Role, path: &str) -> Option<bool> {
        self.lookup(path).map(|roles| roles.contains(&role))
    }

    pub fn exact_routes(&self) -> impl Iterator<Item = (&str, &BTreeSet<Role>)> {
        self.exact.iter().map(|(path, roles)| (path.as_str(), roles))
    }

    pub fn pattern_routes(&self) -> impl Iterator<Item = (&RoutePattern, &BTreeSet<Role>)> {
        self.patterns.iter().map(|(pattern, roles)| (pattern, roles))
    }

    pub fn public_routes(&self) -> impl Iterator<Item = &str> {
        self.public.iter().map(String::as_str)
    }

    fn insert(&mut self, pattern: RoutePattern, roles: BTreeSet<Role>) {
        match pattern {
            RoutePattern::Exact(path) => {
                self.exact.insert(path, roles);
            }
            pattern @ RoutePattern::Param(_) => {
                if let Some(existing) = self.patterns.iter_mut().find(|(p, _)| *p == pattern) {
                    existing.1 = roles;
                } else {
                    self.patterns.push((pattern, roles));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_table_matches_dashboard_policy() {
        let table = PermissionTable::canonical();
        assert_eq!(table.allows(Role::Administrator, "/usuarios"), Some(true));
        assert_eq!(table.allows(Role::Employee, "/usuarios"), Some(false));
        assert_eq!(table.allows(Role::Manager, "/analitica"), Some(true));
        assert_eq!(table.allows(Role::Employee, "/analitica"), Some(true));
        assert_eq!(table.allows(Role::Administrator, "/analitica"), Some(false));
        for role in Role::ALL {
            assert_eq!(table.allows(role, "/dashboard"), Some(true));
        }
        assert_eq!(table.allows(Role::Employee, "/no-such-page"), None);
    }

    #[test]
    fn exact_match_takes_precedence_over_patterns() {
        let table = PermissionTable::new()
            .with_route("/proyectos/:id", &[Role::Manager])
            .expect("pattern")
            .with_route("/proyectos/nuevo", &[Role::Administrator])
            .expect("exact");
        assert_eq!(table.allows(Role::Administrator, "/proyectos/nuevo"), Some(true));
        assert_eq!(table.allows(Role::Manager, "/proyectos/nuevo"), Some(false));
        assert_eq!(table.allows(Role::Manager, "/proyectos/12"), Some(true));
    }

    #[test]
    fn patterns_are_tried_in_declaration_order() {
        let table = PermissionTable::new()
            .with_route("/cursos/:id", &[Role::Manager])
            .expect("first")
            .with_route("/cursos/*", &[Role::Employee])
            .expect("second");
        assert_eq!(table.allows(Role::Manager, "/cursos/7"), Some(true));
        assert_eq!(table.allows(Role::Employee, "/cursos/7"), Some(false));
        assert_eq!(table.allows(Role::Employee, "/cursos/7/modulos"), Some(true));
    }

    #[test]
    fn lookup_normalizes_request_paths() {
        let table = PermissionTable::canonical();
        assert!(table.lookup("/perfil/").is_some());
        assert!(table.lookup("/perfil?tab=datos").is_some());
        assert!(table.is_public("/login?next=%2Fdashboard"));
    }

    #[test]
    fn revoke_removes_a_single_role() {
        let mut table = PermissionTable::canonical();
        table.revoke("/dashboard", Role::Administrator);
        assert_eq!(table.allows(Role::Administrator, "/dashboard"), Some(false));
        assert_eq!(table.allows(Role::Manager, "/dashboard"), Some(true));
    }

    #[test]
    fn loads_yaml_with_legacy_role_names() {
        let yaml = r#"
routes:
  - path: /dashboard
    roles: [empleado, Manager, administrador]
  - path: /proyectos/:id
    roles: [manager]
"#;
        let table = PermissionTable::from_yaml_str(yaml).expect("table");
        assert_eq!(table.allows(Role::Employee, "/dashboard"), Some(true));
        assert_eq!(table.allows(Role::Manager, "/proyectos/3"), Some(true));
        assert!(table.is_public("/login"));
    }

    #[test]
    fn yaml_rejects_bad_entries() {
        assert!(PermissionTable::from_yaml_str("routes: [{path: nope, roles: [manager]}]").is_err());
        assert!(PermissionTable::from_yaml_str("routes: [{path: /x, roles: []}]").is_err());
        assert!(PermissionTable::from_yaml_str("routes: [{path: /x, roles: [owner]}]").is_err());
        assert!(PermissionTable::from_yaml_str(r#"public: ["/x/:id"]"#).is_err());
    }

    #[test]
    fn yaml_rejects_patterns_outside_segment_charset() {
        let err = PermissionTable::from_yaml_str(
            "routes:\n  - path: \"/reportes(/:id\"\n    roles: [manager]\n",
        )
        .expect_err("unbalanced paren");
        assert!(matches!(err, AuthzError::InvalidRoute(_)));
        assert!(PermissionTable::new().with_route("/v1.0/:id", &[Role::Manager]).is_err());

        let table = PermissionTable::new()
            .with_route("/v1-0/:id", &[Role::Manager])
            .expect("table");
        assert_eq!(table.allows(Role::Manager, "/v1-0/5"), Some(true));
        assert_eq!(table.allows(Role::Manager, "/v1x0/5"), None);
    }
}
