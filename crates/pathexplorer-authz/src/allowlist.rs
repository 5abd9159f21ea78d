//! Per-role route allow-lists and their reconciliation with the table.
//!
//! Older dashboard code encoded the route policy a second time as a set of
//! routes common to every signed-in user plus one list per role. Those lists
//! are only kept to be checked against [`PermissionTable`]: any path/role
//! pair on which the two disagree is reported, never silently resolved.
use crate::{AuthzError, AuthzResult, PermissionTable, Role, normalize_path};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoleAllowList {
    #[serde(default)]
    pub common: BTreeSet<String>,
    #[serde(default)]
    pub roles: BTreeMap<Role, BTreeSet<String>>,
}

/// One path/role pair on which the table and the allow-lists disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConflict {
    pub path: String,
    pub role: Role,
    pub table_allows: bool,
    pub allowlist_allows: bool,
}

impl fmt::Display for PolicyConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} for {}: table {}, allow-list {}",
            self.path,
            self.role,
            verdict(self.table_allows),
            verdict(self.allowlist_allows)
        )
    }
}

fn verdict(allowed: bool) -> &'static str {
    if allowed { "allows" } else { "denies" }
}

impl RoleAllowList {
    /// The allow-lists as the dashboard's client-side verifier defined them.
    pub fn legacy() -> Self {
        let list = |paths: &[&str]| paths.iter().map(|p| (*p).to_string()).collect();
        let mut roles = BTreeMap::new();
        roles.insert(
            Role::Employee,
            list(&["/proyecto-actual", "/cursos", "/mi-desempeno", "/analitica"]),
        );
        roles.insert(Role::Manager, list(&["/proyectos", "/equipo", "/analitica"]));
        roles.insert(
            Role::Administrator,
            list(&["/usuarios", "/autorizaciones", "/departamentos"]),
        );
        Self {
            common: list(&["/dashboard", "/perfil", "/configuracion"]),
            roles,
        }
    }

    /// Derive allow-lists from the exact routes of `table`.
    pub fn from_table(table: &PermissionTable) -> Self {
        let mut lists = Self::default();
        for (path, allowed) in table.exact_routes() {
            if Role::ALL.iter().all(|role| allowed.contains(role)) {
                lists.common.insert(path.to_string());
                continue;
            }
            for role in allowed {
                lists
                    .roles
                    .entry(*role)
                    .or_default()
                    .insert(path.to_string());
            }
        }
        lists
    }

    pub fn from_yaml_str(contents: &str) -> AuthzResult<Self> {
        let lists: RoleAllowList = serde_yaml::from_str(contents)
            .map_err(|err| AuthzError::InvalidTable(err.to_string()))?;
        Ok(Self {
            common: lists.common.iter().map(|p| normalize_path(p)).collect(),
            roles: lists
                .roles
                .into_iter()
                .map(|(role, paths)| (role, paths.iter().map(|p| normalize_path(p)).collect()))
                .collect(),
        })
    }

    pub fn allows(&self, role: Role, path: &str) -> bool {
        let path = normalize_path(path);
        self.common.contains(&path)
            || self
                .roles
                .get(&role)
                .is_some_and(|paths| paths.contains(&path))
    }

    fn paths(&self) -> BTreeSet<String> {
        let mut paths = self.common.clone();
        for role_paths in self.roles.values() {
            paths.extend(role_paths.iter().cloned());
        }
        paths
    }
}

/// Compare every exact path known to either side, for every role.
pub fn find_conflicts(table: &PermissionTable, lists: &RoleAllowList) -> Vec<PolicyConflict> {
    let mut paths = lists.paths();
    paths.extend(table.exact_routes().map(|(path, _)| path.to_string()));

    let mut conflicts = Vec::new();
    for path in paths {
        if table.is_public(&path) {
            continue;
        }
        for role in Role::ALL {
            let table_allows = table.allows(role, &path).unwrap_or(false);
            let allowlist_allows = lists.allows(role, &path);
            if table_allows != allowlist_allows {
                conflicts.push(PolicyConflict {
                    path: path.clone(),
                    role,
                    table_allows,
                    allowlist_allows,
                });
            }
        }
    }
    conflicts
}

impl PermissionTable {
    /// Fail when `lists` disagrees with this table anywhere.
    pub fn ensure_consistent_with(&self, lists: &RoleAllowList) -> AuthzResult<()> {
        let conflicts = find_conflicts(self, lists);
        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(AuthzError::PolicyConflict(conflicts))
        }
    }
}
