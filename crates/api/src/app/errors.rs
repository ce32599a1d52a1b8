//! Uniform error envelope.
//!
//! Every handled failure is rendered as
//! `{"kind", "message", "fields"?, "hint"?}` with a status matching the kind.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use qsadmin_auth::AuthzError;
use qsadmin_core::{DomainError, FieldError};

const CONFLICT_HINT: &str = "reload the record and retry with its current version";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthenticated(_) => Self::Unauthenticated(err.to_string()),
            AuthzError::Forbidden(_) => Self::Forbidden(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::Validation(_)) => "validation",
            Self::Domain(DomainError::NotFound { .. }) => "not_found",
            Self::Domain(DomainError::ConcurrencyConflict { .. }) => "concurrency_conflict",
            Self::Domain(DomainError::Storage(_)) => "internal",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Domain(DomainError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Domain(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Domain(DomainError::ConcurrencyConflict { .. }) => StatusCode::CONFLICT,
            Self::Domain(DomainError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let mut response = match &self {
            Self::Domain(DomainError::Storage(detail)) => {
                tracing::error!(error = %detail, "storage failure");
                json_error(status, kind, "internal server error", &[], None)
            }
            Self::Domain(err @ DomainError::ConcurrencyConflict { .. }) => {
                json_error(status, kind, err.to_string(), &[], Some(CONFLICT_HINT))
            }
            Self::Domain(err) => json_error(status, kind, err.to_string(), err.field_errors(), None),
            Self::Unauthenticated(msg) | Self::Forbidden(msg) => json_error(status, kind, msg.clone(), &[], None),
        };

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

pub fn json_error(
    status: StatusCode,
    kind: &'static str,
    message: impl Into<String>,
    fields: &[FieldError],
    hint: Option<&'static str>,
) -> Response {
    let mut body = json!({
        "kind": kind,
        "message": message.into(),
    });
    if !fields.is_empty() {
        body["fields"] = json!(fields);
    }
    if let Some(hint) = hint {
        body["hint"] = json!(hint);
    }
    (status, axum::Json(body)).into_response()
}
