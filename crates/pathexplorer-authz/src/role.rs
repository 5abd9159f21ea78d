//! Closed role model and boundary normalization.
//!
//! Upstream services and older cookies spell roles in several ways
//! (`empleado`, `Empleado`, `employee`, `administrador`, ...). Every external
//! spelling is converted here, once, before any comparison happens.
use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Employee,
    Manager,
    Administrator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Employee, Role::Manager, Role::Administrator];

    /// Map any known external spelling onto the canonical role.
    ///
    /// Matching ignores surrounding whitespace, ASCII case and the accents
    /// used by the Spanish spellings.
    pub fn normalize(raw: &str) -> Option<Role> {
        let folded: String = raw
            .trim()
            .chars()
            .map(|ch| match ch {
                'á' | 'Á' => 'a',
                'é' | 'É' => 'e',
                'í' | 'Í' => 'i',
                'ó' | 'Ó' => 'o',
                'ú' | 'Ú' => 'u',
                other => other.to_ascii_lowercase(),
            })
            .collect();
        match folded.as_str() {
            "employee" | "empleado" => Some(Role::Employee),
            "manager" | "gerente" => Some(Role::Manager),
            "administrator" | "administrador" | "admin" => Some(Role::Administrator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Manager => "manager",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        Role::normalize(value).ok_or_else(|| AuthzError::UnknownRole(value.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Role::normalize(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown role: {raw}")))
    }
}
