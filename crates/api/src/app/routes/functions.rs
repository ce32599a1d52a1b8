use std::sync::Arc;

use axum::Json;
use axum::extract::Extension;
use axum::routing::get;

use qsadmin_auth::FunctionDescriptor;

use crate::app::routes::{AREA, Endpoint};
use crate::context::AppContext;

pub fn endpoints() -> Vec<Endpoint> {
    vec![Endpoint::gated(
        FunctionDescriptor::area_action(AREA, "Function", "Index", "List registered functions"),
        get(index),
    )]
}

async fn index(Extension(app): Extension<Arc<AppContext>>) -> Json<Vec<FunctionDescriptor>> {
    Json(app.registry.descriptors().cloned().collect())
}
