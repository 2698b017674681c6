//! Role and role-claim models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient;

/// Role that holds every permission implicitly
pub const ADMINISTRATOR_ROLE: &str = "Administrator";

/// Role given to every newly registered user
pub const BASIC_ROLE: &str = "Basic";

/// Roles that cannot be renamed or deleted
pub fn is_protected_role(name: &str) -> bool {
    name.eq_ignore_ascii_case(ADMINISTRATOR_ROLE) || name.eq_ignore_ascii_case(BASIC_ROLE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_on: DateTime<Utc>,
}

impl Role {
    pub fn new(name: String, description: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description,
            created_on: Utc::now(),
        }
    }
}

/// Input for `POST /api/identity/role`; a blank id creates
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInput {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Row of `role_claims`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoleClaim {
    pub id: i64,
    pub role_id: String,
    pub claim_type: String,
    pub claim_value: String,
    pub description: String,
    pub claim_group: String,
}

/// One checkbox of the permission editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleClaimEntry {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub role_id: String,
    #[serde(rename = "type", default)]
    pub claim_type: String,
    pub value: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissions {
    pub role_id: String,
    pub role_name: String,
    pub role_claims: Vec<RoleClaimEntry>,
}

/// Input for `POST /api/identity/role/permissions/updateall`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePermissionsInput {
    pub role_id: String,
    #[serde(default)]
    pub role_claims: Vec<RoleClaimEntry>,
}
