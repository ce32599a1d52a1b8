use std::sync::Arc;

use axum::Json;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::{Value, json};

use qsadmin_auth::Principal;

use crate::app::errors::ApiError;
use crate::app::routes::Endpoint;
use crate::context::AppContext;

pub fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::public("/health", get(health)),
        Endpoint::public("/test/get", get(test_get)),
        Endpoint::public("/account/whoami", get(whoami)),
    ]
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

async fn test_get() -> Json<Value> {
    Json(json!({ "message": "ok" }))
}

/// Caller identity plus the functions its roles currently grant.
async fn whoami(
    Extension(app): Extension<Arc<AppContext>>,
    principal: Option<Extension<Principal>>,
) -> Result<Json<Value>, ApiError> {
    let Some(Extension(principal)) = principal else {
        return Err(ApiError::Unauthenticated("authentication required".into()));
    };
    let functions = app.cache.load().effective_functions(&principal);
    Ok(Json(json!({
        "user_id": principal.user_id(),
        "roles": principal.roles(),
        "functions": functions,
    })))
}
