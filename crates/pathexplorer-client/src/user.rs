use pathexplorer_authz::Role;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The signed-in person as the backend describes them.
///
/// Serialized with English field names; the backend's Spanish names
/// (`nombre`, `apellido`, `correo`, `cargo`) are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(deserialize_with = "id_string_or_number")]
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "apellido")]
    pub surname: String,
    #[serde(alias = "correo")]
    pub email: String,
    pub role: Role,
    #[serde(default, alias = "cargo", skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        if self.surname.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.surname)
        }
    }

    pub fn apply(&mut self, update: &ProfileUpdate) {
        self.name = update.name.clone();
        self.surname = update.surname.clone();
        self.email = update.email.clone();
        self.position = Some(update.position.clone());
    }
}

/// Body of `PATCH /auth/update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "cargo")]
    pub position: String,
}

fn id_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "user id must be a string or number, got {other}"
        ))),
    }
}
