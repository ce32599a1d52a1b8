//! `qsadmin-auth`: authentication/authorization boundary.
//!
//! Decoupled from HTTP and storage: token validation, the function registry,
//! the role → function permission snapshot and the pure authorize check.

pub mod authorize;
pub mod cache;
pub mod claims;
pub mod function;
pub mod principal;
pub mod registry;
pub mod token;

pub use authorize::{AuthzError, authorize};
pub use cache::{PermissionCache, PermissionSnapshot};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use function::{Function, FunctionDescriptor};
pub use principal::Principal;
pub use registry::{FunctionRegistry, RegistryError};
pub use token::{Hs256JwtValidator, JwtSettings, JwtValidator};
