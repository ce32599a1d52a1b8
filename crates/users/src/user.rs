use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use qsadmin_core::{Entity, RoleId, UserId, Version};

/// Account status. Disabled accounts stay listed but are flagged.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Enabled,
    Disabled,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown user status '{0}'")]
pub struct UnknownStatus(pub String);

impl core::str::FromStr for UserStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Back-office user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    user_name: String,
    nick_name: Option<String>,
    status: UserStatus,
    remark: Option<String>,
    role_ids: Vec<RoleId>,
    version: Version,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Mutable user fields, shared by create and revise.
#[derive(Debug, Clone)]
pub struct UserFields<'a> {
    pub user_name: &'a str,
    pub nick_name: Option<&'a str>,
    pub status: UserStatus,
    pub remark: Option<&'a str>,
    pub role_ids: &'a [RoleId],
}

impl User {
    pub fn create(id: UserId, fields: UserFields<'_>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_name: fields.user_name.trim().to_string(),
            nick_name: optional_text(fields.nick_name),
            status: fields.status,
            remark: optional_text(fields.remark),
            role_ids: dedup_roles(fields.role_ids),
            version: Version::INITIAL,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: UserId,
        user_name: String,
        nick_name: Option<String>,
        status: UserStatus,
        remark: Option<String>,
        role_ids: Vec<RoleId>,
        version: Version,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_name,
            nick_name,
            status,
            remark,
            role_ids,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn revise(&self, fields: UserFields<'_>, now: DateTime<Utc>) -> Self {
        Self {
            user_name: fields.user_name.trim().to_string(),
            nick_name: optional_text(fields.nick_name),
            status: fields.status,
            remark: optional_text(fields.remark),
            role_ids: dedup_roles(fields.role_ids),
            updated_at: now,
            ..self.clone()
        }
    }

    /// Copy without `role`. Returns `None` if the user never held it.
    pub fn without_role(&self, role: RoleId, now: DateTime<Utc>) -> Option<Self> {
        if !self.role_ids.contains(&role) {
            return None;
        }
        Some(Self {
            role_ids: self.role_ids.iter().copied().filter(|r| *r != role).collect(),
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn nick_name(&self) -> Option<&str> {
        self.nick_name.as_deref()
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn remark(&self) -> Option<&str> {
        self.remark.as_deref()
    }

    pub fn role_ids(&self) -> &[RoleId] {
        &self.role_ids
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for User {
    type Id = UserId;
    const KIND: &'static str = "user";

    fn id(&self) -> UserId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

// Keeps first-seen order.
fn dedup_roles(roles: &[RoleId]) -> Vec<RoleId> {
    let mut out: Vec<RoleId> = Vec::with_capacity(roles.len());
    for r in roles {
        if !out.contains(r) {
            out.push(*r);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(name: &'a str, roles: &'a [RoleId]) -> UserFields<'a> {
        UserFields {
            user_name: name,
            nick_name: Some("  "),
            status: UserStatus::Enabled,
            remark: None,
            role_ids: roles,
        }
    }

    #[test]
    fn create_trims_and_dedups_roles() {
        let r = RoleId::new();
        let u = User::create(UserId::new(), fields(" alice ", &[r, r]), Utc::now());
        assert_eq!(u.user_name(), "alice");
        assert_eq!(u.nick_name(), None);
        assert_eq!(u.role_ids(), &[r]);
        assert_eq!(u.version(), Version::INITIAL);
    }

    #[test]
    fn without_role_strips_only_that_role() {
        let (a, b) = (RoleId::new(), RoleId::new());
        let u = User::create(UserId::new(), fields("bob", &[a, b]), Utc::now());

        let stripped = u.without_role(a, Utc::now()).unwrap();
        assert_eq!(stripped.role_ids(), &[b]);
        assert_eq!(stripped.version(), u.version());
        assert!(stripped.without_role(a, Utc::now()).is_none());
    }

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!("disabled".parse::<UserStatus>(), Ok(UserStatus::Disabled));
        assert_eq!(UserStatus::Enabled.as_str(), "enabled");
        assert!("locked".parse::<UserStatus>().is_err());
        assert_eq!(serde_json::to_string(&UserStatus::Disabled).unwrap(), "\"disabled\"");
    }
}
