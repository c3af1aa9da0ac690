// ── Domain model ──
//
// Session payload as issued by `/auth/login` and `/api/session`, plus the
// role keys routes declare. Field names follow the backend's JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Backend role name for regular users.
pub const ROLE_USER: &str = "Usuario";
/// Backend role name for administrators.
pub const ROLE_ADMIN: &str = "Administrador";

/// Authenticated principal: bearer token, its expiry, and the user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthData {
    pub token: String,
    pub expire: DateTime<Utc>,
    pub user: User,
}

impl AuthData {
    /// Whether the token's expiry is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire <= now
    }
}

/// User profile carried in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// National identity number (RUT).
    #[serde(rename = "rut", default, deserialize_with = "null_as_default")]
    pub national_id: String,
    #[serde(rename = "role", default, deserialize_with = "null_as_default")]
    pub roles: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Cost-centre ids the user belongs to.
    #[serde(rename = "cc", default, deserialize_with = "null_as_default")]
    pub cost_centres: Vec<String>,
}

/// The backend sends `null` for profile fields it never filled in.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Role keys used in route metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum UserType {
    Admin,
    User,
}

impl UserType {
    /// The role name the backend stores for this key.
    pub fn role_name(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::User => ROLE_USER,
        }
    }
}
