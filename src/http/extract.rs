//! Extractors for the JSON body stage and path parameters.
//!
//! Every rejection is an `ApiError`, so framework-level parse failures flow
//! into the error boundary like any other failure.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::http::error::{ApiError, ROUTE_NOT_FOUND};

/// JSON body whose parse failures become validation errors.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

/// JSON body that must also pass its `Validate` rules.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_values()
            .flatten()
            .map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => e.code.to_string(),
            })
            .collect();
        messages.sort();
        ApiError::Validation(messages.join(", "))
    }
}

/// A job id path parameter. Malformed ids are cast failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobId(pub Uuid);

impl<S> FromRequestParts<S> for JobId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound(ROUTE_NOT_FOUND.to_string()))?;
        Uuid::parse_str(&raw)
            .map(JobId)
            .map_err(|_| ApiError::Cast { value: raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, response::IntoResponse, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 3, message = "Name too short"))]
        name: String,
    }

    fn app() -> Router {
        Router::new().route(
            "/",
            post(|ValidJson(p): ValidJson<Payload>| async move { p.name.into_response() }),
        )
    }

    async fn send(body: &'static str, content_type: &'static str) -> (StatusCode, String) {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let (status, body) = send(r#"{"name":"Ada Lovelace"}"#, "application/json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Ada Lovelace");
    }

    #[tokio::test]
    async fn malformed_json_is_validation_error() {
        let (status, body) = send("{oops", "application/json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("\"statusCode\":400"));
    }

    #[tokio::test]
    async fn missing_content_type_is_validation_error() {
        let (status, _) = send(r#"{"name":"Ada"}"#, "text/plain").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rule_violations_are_reported() {
        let (status, body) = send(r#"{"name":"Al"}"#, "application/json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Name too short"));
    }
}
