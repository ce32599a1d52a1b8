//! Request extractors that fail with the uniform envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::{Json, async_trait};
use serde::de::DeserializeOwned;

use qsadmin_core::DomainError;

use crate::app::errors::ApiError;

/// `Json<T>` whose rejection is a `validation` error instead of axum's plain-text 4xx.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(DomainError::invalid(rejected_field(&rejection), rejection.body_text()).into()),
        }
    }
}

/// Name the offending field when serde reports one, `body` otherwise.
///
/// Only data errors carry a field. Their text follows axum 0.7:
/// `Failed to deserialize the JSON body into the target type: <path>: <serde message>`.
fn rejected_field(rejection: &JsonRejection) -> String {
    let JsonRejection::JsonDataError(err) = rejection else {
        return "body".to_string();
    };
    let text = err.body_text();
    for marker in ["missing field `", "unknown field `"] {
        if let Some(rest) = text.split(marker).nth(1) {
            if let Some(field) = rest.split('`').next() {
                return field.to_string();
            }
        }
    }
    if let Some((path, _)) = text
        .strip_prefix("Failed to deserialize the JSON body into the target type: ")
        .and_then(|rest| rest.split_once(": "))
    {
        if !path.contains(' ') {
            return path.to_string();
        }
    }
    "body".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Update {
        id: String,
        version: u64,
    }

    async fn extract(body: &'static str) -> Result<ApiJson<Update>, ApiError> {
        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        ApiJson::<Update>::from_request(req, &()).await
    }

    fn field_of(err: ApiError) -> String {
        match err {
            ApiError::Domain(e) => e.field_errors()[0].field.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_field_is_named() {
        let err = extract(r#"{"id":"a"}"#).await.unwrap_err();
        assert_eq!(field_of(err), "version");
    }

    #[tokio::test]
    async fn syntax_error_is_a_body_validation_error() {
        let err = extract("{not json").await.unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(field_of(err), "body");
    }

    #[tokio::test]
    async fn well_formed_body_decodes() {
        let ApiJson(update) = extract(r#"{"id":"a","version":2}"#).await.unwrap();
        assert_eq!(update.version, 2);
    }

    #[tokio::test]
    async fn wrong_type_names_the_field_path() {
        let err = extract(r#"{"id":"a","version":"two"}"#).await.unwrap_err();
        assert_eq!(field_of(err), "version");
    }

    #[tokio::test]
    async fn missing_content_type_is_a_body_error() {
        let req = Request::builder()
            .method("POST")
            .body(Body::from(r#"{"id":"a","version":2}"#))
            .unwrap();
        let err = ApiJson::<Update>::from_request(req, &()).await.unwrap_err();
        assert_eq!(field_of(err), "body");
    }
}
