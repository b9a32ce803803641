//! Request bodies. Field names follow the wire format (`User`, `AdminSecret`, ...),
//! with lowercase and camelCase spellings accepted as well, matching the
//! snapshot decoder. Missing fields decode to empty values and fail in the
//! store instead.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use service::auth::{RoleKey, SecretKey, UserKey};

use crate::errors::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LoginForm {
    #[serde(alias = "user")]
    pub user: UserKey,
    #[serde(alias = "secret")]
    pub secret: SecretKey,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct QueryForm {
    #[serde(alias = "user")]
    pub user: UserKey,
    #[serde(alias = "role")]
    pub role: RoleKey,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModifyUserForm {
    #[serde(alias = "adminUser", alias = "adminuser")]
    pub admin_user: UserKey,
    #[serde(alias = "adminSecret", alias = "adminsecret")]
    pub admin_secret: SecretKey,
    #[serde(alias = "user")]
    pub user: UserKey,
    #[serde(alias = "secret")]
    pub secret: SecretKey,
    #[serde(alias = "roles")]
    pub roles: Option<Vec<RoleKey>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModifyRoleForm {
    #[serde(alias = "adminUser", alias = "adminuser")]
    pub admin_user: UserKey,
    #[serde(alias = "adminSecret", alias = "adminsecret")]
    pub admin_secret: SecretKey,
    #[serde(alias = "user")]
    pub user: UserKey,
    #[serde(alias = "role")]
    pub role: RoleKey,
}

/// Decode a JSON body regardless of its content type.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}
