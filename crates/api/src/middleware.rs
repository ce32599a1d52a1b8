use std::sync::Arc;

use axum::extract::{MatchedPath, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::context::AppContext;
use crate::pipeline::{self, RequestContext};

/// Runs the pipeline stages for a routed request.
///
/// On success the principal, if any, is inserted as a request extension and
/// the handler runs; otherwise the handler is skipped and the error envelope
/// is returned.
pub async fn request_pipeline(State(app): State<Arc<AppContext>>, mut req: Request, next: Next) -> Response {
    let route = match req.extensions().get::<MatchedPath>() {
        Some(path) => path.as_str().to_owned(),
        None => req.uri().path().to_owned(),
    };
    // A non-ASCII header value is treated like a malformed one.
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_owned());

    let snapshot = app.cache.load();
    let ctx = pipeline::authenticate(
        RequestContext::new(&route),
        authorization.as_deref(),
        app.validator.as_ref(),
        Utc::now().timestamp(),
    );
    let ctx = pipeline::resolve_function(ctx, &app.registry);

    match pipeline::authorize(ctx, &snapshot) {
        Ok(ctx) => {
            if let Some(principal) = ctx.principal {
                req.extensions_mut().insert(principal);
            }
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}
