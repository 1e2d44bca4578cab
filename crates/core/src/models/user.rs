//! User entity models and auth DTOs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::normalize::{
    id_or_generate, optional_scalar_int, optional_scalar_text, optional_text, require_text, Scalar,
};
use crate::types::EntityId;

const ENTITY: &str = "user";

/// Public profile snapshot returned by the backend.
///
/// This is what the session store caches as the "current user". It never
/// carries the password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPublic {
    pub id: EntityId,
    pub name: Option<String>,
    /// Phone number; doubles as the login identifier.
    pub phone: String,
    pub admin: bool,
    pub citizenship_num: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub ward_num: Option<i32>,
}

impl UserPublic {
    /// A citizen counts as verified once an admin has recorded their
    /// citizenship number.
    pub fn is_verified(&self) -> bool {
        self.citizenship_num.is_some()
    }
}

/// Wire shape of [`UserPublic`]. Every field is optional so that parsing can
/// report exactly what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserPublicPayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub admin: Option<bool>,
    pub citizenship_num: Option<Scalar>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub ward_num: Option<Scalar>,
}

impl TryFrom<UserPublicPayload> for UserPublic {
    type Error = CoreError;

    fn try_from(payload: UserPublicPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            id: require_text(ENTITY, "id", payload.id)?,
            name: optional_text(payload.name),
            phone: require_text(ENTITY, "phone", payload.phone)?,
            admin: payload.admin.unwrap_or(false),
            citizenship_num: optional_scalar_text(payload.citizenship_num),
            district: optional_text(payload.district),
            city: optional_text(payload.city),
            ward_num: optional_scalar_int(ENTITY, "ward_num", payload.ward_num)?,
        })
    }
}

/// Full user record, including the password. Only built caller-side
/// (registration forms, fixtures); the backend never returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: EntityId,
    pub name: Option<String>,
    pub password: String,
    pub phone: String,
    pub citizenship_num: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub ward_num: Option<i32>,
    pub admin: bool,
}

impl User {
    /// Drop the password and keep the public profile.
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            admin: self.admin,
            citizenship_num: self.citizenship_num.clone(),
            district: self.district.clone(),
            city: self.city.clone(),
            ward_num: self.ward_num,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserPayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub citizenship_num: Option<Scalar>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub ward_num: Option<Scalar>,
    pub admin: Option<bool>,
}

impl TryFrom<UserPayload> for User {
    type Error = CoreError;

    fn try_from(payload: UserPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            id: id_or_generate(payload.id),
            name: optional_text(payload.name),
            password: payload.password.unwrap_or_default(),
            phone: payload.phone.unwrap_or_default(),
            citizenship_num: optional_scalar_text(payload.citizenship_num),
            district: optional_text(payload.district),
            city: optional_text(payload.city),
            ward_num: optional_scalar_int(ENTITY, "ward_num", payload.ward_num)?,
            admin: payload.admin.unwrap_or(false),
        })
    }
}

/// Body of `POST /user/register/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub password: String,
    pub phone: String,
}

/// Body of `POST /user/login/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub phone: String,
    pub password: String,
}

impl Credentials {
    pub fn new(phone: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            password: password.into(),
        }
    }
}

/// Response of a successful credential exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Citizenship details recorded by an admin when verifying an identity.
/// Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserCitizenship {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citizenship_num: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward_num: Option<i32>,
}
