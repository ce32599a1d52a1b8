use serde::{Deserialize, Serialize};
use thiserror::Error;

use qsadmin_core::{RoleId, UserId};

/// JWT claims model.
///
/// Registered claim names are kept (`iss`, `aud`, `sub`, `iat`, `exp`) so the
/// token is readable by any standard JWT tooling. Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub aud: String,

    /// Subject: the authenticated user.
    pub sub: UserId,

    /// Role ids assigned to the subject.
    #[serde(default)]
    pub roles: Vec<RoleId>,

    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("missing bearer token")]
    Missing,

    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("invalid token issuer")]
    InvalidIssuer,

    #[error("invalid token audience")]
    InvalidAudience,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Deterministically validate the claims' time window against `now` (Unix seconds).
///
/// Zero clock-skew tolerance: a token is valid for `iat <= now < exp`.
pub fn validate_claims(claims: &JwtClaims, now: i64) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
