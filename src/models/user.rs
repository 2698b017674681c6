//! User model
//!
//! Users are keyed by a UUID string. Accounts are soft-deleted, and
//! `is_active` gates login independently of deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient;

/// User entity as stored in `users`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub profile_picture_url: Option<String>,
    /// Password hash (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub email_confirmed: bool,
    pub is_active: bool,
    pub created_on: DateTime<Utc>,
}

impl User {
    /// Build a new, not yet persisted user with a fresh id.
    ///
    /// The password must already be hashed.
    pub fn new(
        first_name: String,
        last_name: String,
        user_name: String,
        email: String,
        password_hash: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            first_name,
            last_name,
            user_name,
            email,
            phone_number: None,
            profile_picture_url: None,
            password_hash,
            email_confirmed: false,
            is_active: true,
            created_on: Utc::now(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

fn default_true() -> bool {
    true
}

/// Inline file carried inside a JSON body (profile pictures on register)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub upload_type: i64,
    /// Base64 payload, optionally prefixed with a `data:` URL header
    #[serde(default)]
    pub data: String,
}

/// Input for `POST /api/identity/user`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default = "default_true", alias = "activateUser")]
    pub is_active: bool,
    #[serde(default)]
    pub upload_request: Option<UploadRequest>,
}

/// Input for `PUT /api/identity/user?id=`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub upload_request: Option<UploadRequest>,
}

/// One row of the user-roles editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleEntry {
    pub role_name: String,
    #[serde(default)]
    pub role_description: String,
    #[serde(default)]
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRolesPayload {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_roles: Vec<UserRoleEntry>,
}

/// Input for `PUT /api/identity/account/password-and-email`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCredentialsInput {
    #[serde(default)]
    pub old_email: String,
    #[serde(default)]
    pub new_email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[serde(default, alias = "email", alias = "userName")]
    pub email_or_user_name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub user_id: String,
    pub refresh_token_expiry_time: DateTime<Utc>,
}
