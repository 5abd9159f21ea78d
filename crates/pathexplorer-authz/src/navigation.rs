//! Sidebar menu and post-login landing route derived from the table.
use crate::{LOGIN_ROUTE, PermissionTable, Role};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub title: &'static str,
    pub href: &'static str,
}

const COMMON_HEAD: &[NavItem] = &[
    NavItem { title: "Dashboard", href: "/dashboard" },
    NavItem { title: "Mi Perfil", href: "/perfil" },
];

const EMPLOYEE_ITEMS: &[NavItem] = &[
    NavItem { title: "Mi Proyecto", href: "/proyecto-actual" },
    NavItem { title: "Mis Cursos", href: "/cursos" },
    NavItem { title: "Mi Desempeño", href: "/mi-desempeno" },
];

const MANAGER_ITEMS: &[NavItem] = &[
    NavItem { title: "Gestión de Proyectos", href: "/proyectos" },
    NavItem { title: "Equipo", href: "/equipo" },
    NavItem { title: "Analítica", href: "/analitica" },
];

const ADMINISTRATOR_ITEMS: &[NavItem] = &[
    NavItem { title: "Gestión de Usuarios", href: "/usuarios" },
    NavItem { title: "Autorizaciones", href: "/autorizaciones" },
    NavItem { title: "Departamentos", href: "/departamentos" },
];

const COMMON_TAIL: &[NavItem] = &[NavItem { title: "Configuración", href: "/configuracion" }];

/// Menu entries for `role`, in sidebar order.
///
/// Every candidate entry is filtered through `table`, so a link is only shown
/// when the gates would let the role follow it.
pub fn navigation_for(role: Role, table: &PermissionTable) -> Vec<NavItem> {
    let role_items = match role {
        Role::Employee => EMPLOYEE_ITEMS,
        Role::Manager => MANAGER_ITEMS,
        Role::Administrator => ADMINISTRATOR_ITEMS,
    };
    COMMON_HEAD
        .iter()
        .chain(role_items)
        .chain(COMMON_TAIL)
        .filter(|item| table.allows(role, item.href) == Some(true))
        .cloned()
        .collect()
}

/// Where `/` sends a visitor.
pub fn landing_route(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Administrator) => "/usuarios",
        Some(Role::Manager | Role::Employee) => "/dashboard",
        None => LOGIN_ROUTE,
    }
}
