//! Error boundary.
//!
//! # Responsibilities
//! - Classify every failure raised by a pipeline stage or handler
//! - Map the class to a status code and a client-safe message
//! - Render the one client-visible error shape: `{message, statusCode}`
//! - Rewrite error responses produced outside `ApiError` (framework
//!   rejections, panics, method mismatches) into the same shape
//!
//! Unclassified failures are logged with full detail and reach the client
//! only as a generic 500.

use std::any::Any;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::storage::StorageError;

/// Message sent for any failure the boundary cannot classify.
pub const GENERIC_MESSAGE: &str = "Something went wrong try again later";

/// Message sent when no route matched.
pub const ROUTE_NOT_FOUND: &str = "Route does not exist";

/// The only error representation sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub message: String,
    pub status_code: u16,
}

/// Marks a response whose body is already an `ErrorEnvelope`.
#[derive(Debug, Clone, Copy)]
struct Enveloped;

/// Failure classes recognized by the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RateLimited,
    Unauthenticated,
    NotFound,
    Validation,
    Duplicate,
    Cast,
    PayloadTooLarge,
    Unclassified,
}

impl ErrorClass {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorClass::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorClass::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorClass::NotFound | ErrorClass::Cast => StatusCode::NOT_FOUND,
            ErrorClass::Validation | ErrorClass::Duplicate => StatusCode::BAD_REQUEST,
            ErrorClass::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorClass::Unclassified => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure raised anywhere in the request pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Too many requests, please try again later.")]
    RateLimited { retry_after_secs: u64 },

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Duplicate value entered for {field} field, please choose another value")]
    Duplicate { field: String },

    #[error("No item found with id : {value}")]
    Cast { value: String },

    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("storage failure: {0}")]
    Storage(StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ApiError::RateLimited { .. } => ErrorClass::RateLimited,
            ApiError::Unauthenticated(_) => ErrorClass::Unauthenticated,
            ApiError::NotFound(_) => ErrorClass::NotFound,
            ApiError::Validation(_) => ErrorClass::Validation,
            ApiError::Duplicate { .. } => ErrorClass::Duplicate,
            ApiError::Cast { .. } => ErrorClass::Cast,
            ApiError::PayloadTooLarge { .. } => ErrorClass::PayloadTooLarge,
            ApiError::Storage(_) | ApiError::Internal(_) => ErrorClass::Unclassified,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.class().status_code()
    }

    /// Message safe to show to the client.
    pub fn client_message(&self) -> String {
        match self.class() {
            ErrorClass::Unclassified => GENERIC_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            message: self.client_message(),
            status_code: self.status_code().as_u16(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate { field } => ApiError::Duplicate { field },
            other => ApiError::Storage(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing => ApiError::Internal(err.to_string()),
            _ => ApiError::Unauthenticated(err.client_message().to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.class() == ErrorClass::Unclassified {
            tracing::error!(error = %self, "Unhandled failure");
        }

        let retry_after = match &self {
            ApiError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let mut response = envelope_response(self.envelope());
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

fn envelope_response(envelope: ErrorEnvelope) -> Response {
    let status =
        StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(envelope)).into_response();
    response.extensions_mut().insert(Enveloped);
    response
}

/// Not-found terminal handler, reached only when no route matched.
pub async fn not_found() -> ApiError {
    ApiError::NotFound(ROUTE_NOT_FOUND.to_string())
}

/// Converts a handler panic into an envelope. Used with `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// Outermost response guard: any error status not already rendered as an
/// envelope is replaced by one. Headers set by inner stages are kept.
pub async fn ensure_envelope(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || response.extensions().get::<Enveloped>().is_some()
    {
        return response;
    }

    let envelope = match status {
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => ErrorEnvelope {
            message: ROUTE_NOT_FOUND.to_string(),
            status_code: StatusCode::NOT_FOUND.as_u16(),
        },
        s if s.is_server_error() => {
            tracing::error!(status = %s, "Error response escaped classification");
            ErrorEnvelope {
                message: GENERIC_MESSAGE.to_string(),
                status_code: s.as_u16(),
            }
        }
        s => ErrorEnvelope {
            message: s.canonical_reason().unwrap_or("Bad Request").to_string(),
            status_code: s.as_u16(),
        },
    };

    let (mut parts, _) = response.into_parts();
    let (fresh, body) = envelope_response(envelope).into_parts();
    parts.status = fresh.status;
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::ALLOW);
    parts.headers.extend(fresh.headers);
    parts.extensions.insert(Enveloped);
    Response::from_parts(parts, body)
}
