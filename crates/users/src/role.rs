use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use qsadmin_auth::Function;
use qsadmin_core::{Entity, RoleId, Version};

use crate::user::optional_text;

/// Named bundle of granted functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: RoleId,
    name: String,
    description: Option<String>,
    functions: BTreeSet<Function>,
    version: Version,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Role {
    pub fn create(
        id: RoleId,
        name: &str,
        description: Option<&str>,
        functions: impl IntoIterator<Item = Function>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            description: optional_text(description),
            functions: functions.into_iter().collect(),
            version: Version::INITIAL,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn restore(
        id: RoleId,
        name: String,
        description: Option<String>,
        functions: BTreeSet<Function>,
        version: Version,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            functions,
            version,
            created_at,
            updated_at,
        }
    }

    /// Copy with a new name/description; `functions = None` keeps the current grants.
    pub fn revise(
        &self,
        name: &str,
        description: Option<&str>,
        functions: Option<BTreeSet<Function>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.trim().to_string(),
            description: optional_text(description),
            functions: functions.unwrap_or_else(|| self.functions.clone()),
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn granting(&self, function: Function, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.functions.insert(function);
        next.updated_at = now;
        next
    }

    pub fn revoking(&self, function: &Function, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.functions.remove(function);
        next.updated_at = now;
        next
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn functions(&self) -> &BTreeSet<Function> {
        &self.functions
    }

    pub fn grants(&self, function: &Function) -> bool {
        self.functions.contains(function)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Role {
    type Id = RoleId;
    const KIND: &'static str = "role";

    fn id(&self) -> RoleId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}
