//! Request pipeline stages: authenticate → resolve function → authorize.
//!
//! Each stage takes the [`RequestContext`] built so far and returns the next
//! one. Stages do no IO; the middleware in [`crate::middleware`] feeds them
//! request data and the shared state.

use qsadmin_auth::{
    FunctionDescriptor, FunctionRegistry, JwtValidator, PermissionSnapshot, Principal, TokenValidationError,
};

use crate::app::errors::ApiError;

/// Per-request pipeline state.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Matched route template, e.g. `/admin/product/detail/:id`.
    pub route: &'a str,
    pub principal: Option<Principal>,
    /// Why no principal was attached, if a token was expected or rejected.
    pub token_error: Option<TokenValidationError>,
    pub gate: Option<&'a FunctionDescriptor>,
}

impl<'a> RequestContext<'a> {
    pub fn new(route: &'a str) -> Self {
        Self {
            route,
            principal: None,
            token_error: None,
            gate: None,
        }
    }
}

/// Validate the `Authorization` header value, if any, and attach a principal.
///
/// A missing or invalid token is not an error here: ungated routes still
/// serve anonymous callers. The reason is kept for the authorize stage.
pub fn authenticate<'a>(
    mut ctx: RequestContext<'a>,
    authorization: Option<&str>,
    validator: &dyn JwtValidator,
    now: i64,
) -> RequestContext<'a> {
    let token = match authorization {
        None => Err(TokenValidationError::Missing),
        Some(value) => bearer_token(value).ok_or(TokenValidationError::MalformedHeader),
    };

    match token.and_then(|t| validator.validate(t, now)) {
        Ok(claims) => {
            ctx.principal = Some(Principal::from(claims));
            ctx.token_error = None;
        }
        Err(err) => {
            if err != TokenValidationError::Missing {
                tracing::debug!(route = ctx.route, error = %err, "bearer token rejected");
            }
            ctx.principal = None;
            ctx.token_error = Some(err);
        }
    }
    ctx
}

/// Look up the function gating the matched route.
pub fn resolve_function<'a>(mut ctx: RequestContext<'a>, registry: &'a FunctionRegistry) -> RequestContext<'a> {
    ctx.gate = registry.resolve(ctx.route);
    ctx
}

/// Check the principal against the gate using the current snapshot.
pub fn authorize<'a>(ctx: RequestContext<'a>, snapshot: &PermissionSnapshot) -> Result<RequestContext<'a>, ApiError> {
    match qsadmin_auth::authorize(ctx.principal.as_ref(), ctx.gate, snapshot) {
        Ok(()) => Ok(ctx),
        Err(err) => {
            let user_id = ctx.principal.as_ref().map(|p| p.user_id().to_string());
            tracing::info!(
                route = ctx.route,
                user_id = user_id.as_deref(),
                function = ctx.gate.map(|g| g.function.as_str()),
                reason = %err,
                "request denied"
            );
            match (err, &ctx.token_error) {
                (qsadmin_auth::AuthzError::Unauthenticated(function), Some(reason)) => Err(
                    ApiError::Unauthenticated(format!("authentication required for '{function}': {reason}")),
                ),
                (err, _) => Err(err.into()),
            }
        }
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
