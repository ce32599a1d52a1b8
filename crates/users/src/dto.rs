use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use qsadmin_auth::Function;
use qsadmin_core::validation::non_blank;
use qsadmin_core::{Entity, RoleId, UserId, Version};

use crate::{Role, User, UserStatus};

// -------------------------
// Users
// -------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserInputDto {
    #[serde(default)]
    #[validate(custom(function = "non_blank"), length(max = 64))]
    pub user_name: String,

    #[validate(length(max = 64))]
    pub nick_name: Option<String>,

    #[serde(default)]
    pub status: UserStatus,

    #[validate(length(max = 500))]
    pub remark: Option<String>,

    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserUpdateInputDto {
    pub id: UserId,

    #[serde(default)]
    #[validate(custom(function = "non_blank"), length(max = 64))]
    pub user_name: String,

    #[validate(length(max = 64))]
    pub nick_name: Option<String>,

    #[serde(default)]
    pub status: UserStatus,

    #[validate(length(max = 500))]
    pub remark: Option<String>,

    #[serde(default)]
    pub role_ids: Vec<RoleId>,

    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserOutputDto {
    pub id: UserId,
    pub user_name: String,
    pub nick_name: Option<String>,
    pub status: UserStatus,
    pub remark: Option<String>,
    pub role_ids: Vec<RoleId>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserOutputDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id(),
            user_name: u.user_name().to_string(),
            nick_name: u.nick_name().map(str::to_string),
            status: u.status(),
            remark: u.remark().map(str::to_string),
            role_ids: u.role_ids().to_vec(),
            version: u.version(),
            created_at: u.created_at(),
            updated_at: u.updated_at(),
        }
    }
}

// -------------------------
// Roles
// -------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RoleInputDto {
    #[serde(default)]
    #[validate(custom(function = "non_blank"), length(max = 64))]
    pub name: String,

    #[validate(length(max = 256))]
    pub description: Option<String>,

    #[serde(default)]
    pub functions: Vec<Function>,
}

/// Role update. Omitting `functions` keeps the current grants.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RoleUpdateInputDto {
    pub id: RoleId,

    #[serde(default)]
    #[validate(custom(function = "non_blank"), length(max = 64))]
    pub name: String,

    #[validate(length(max = 256))]
    pub description: Option<String>,

    pub functions: Option<Vec<Function>>,

    pub version: Version,
}

/// Grant or revoke a single function. `version`, when present, is checked
/// against the stored role.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RoleGrantDto {
    pub role_id: RoleId,

    #[serde(default)]
    #[validate(custom(function = "non_blank"))]
    pub function: String,

    pub version: Option<Version>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleOutputDto {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    pub functions: Vec<Function>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Role> for RoleOutputDto {
    fn from(r: Role) -> Self {
        Self {
            id: r.id(),
            name: r.name().to_string(),
            description: r.description().map(str::to_string),
            functions: r.functions().iter().cloned().collect(),
            version: r.version(),
            created_at: r.created_at(),
            updated_at: r.updated_at(),
        }
    }
}
