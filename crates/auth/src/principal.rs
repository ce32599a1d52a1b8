use serde::Serialize;

use qsadmin_core::{RoleId, UserId};

use crate::JwtClaims;

/// Authenticated identity for a single request.
///
/// Built from verified token claims; immutable for the lifetime of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    user_id: UserId,
    roles: Vec<RoleId>,
}

impl Principal {
    pub fn new(user_id: UserId, roles: Vec<RoleId>) -> Self {
        Self { user_id, roles }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }
}

impl From<JwtClaims> for Principal {
    fn from(claims: JwtClaims) -> Self {
        Self::new(claims.sub, claims.roles)
    }
}
