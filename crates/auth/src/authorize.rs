use thiserror::Error;

use crate::{FunctionDescriptor, PermissionSnapshot, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required for '{0}'")]
    Unauthenticated(String),

    #[error("forbidden: missing function '{0}'")]
    Forbidden(String),
}

/// Decide whether a request may reach its handler.
///
/// - `gate == None`: the route is not registered as gated and is allowed.
/// - gated and no principal: `Unauthenticated`.
/// - gated and the principal's roles do not grant the function: `Forbidden`.
///
/// No IO, no panics; a pure policy check over an already-built snapshot.
pub fn authorize(
    principal: Option<&Principal>,
    gate: Option<&FunctionDescriptor>,
    snapshot: &PermissionSnapshot,
) -> Result<(), AuthzError> {
    let Some(gate) = gate else {
        return Ok(());
    };
    let Some(principal) = principal else {
        return Err(AuthzError::Unauthenticated(gate.function.to_string()));
    };

    if snapshot.is_granted(principal, &gate.function) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(gate.function.to_string()))
    }
}
