//! Authentication guard middleware.
//! Applied only to handler sets whose route entry requires authentication.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::token::{extract_bearer_token, TokenKeys};
use crate::http::error::ApiError;
use crate::observability::metrics;

/// Verify the bearer credential and attach the identity, or refuse the
/// request before the handler runs.
pub async fn require_auth(
    State(keys): State<Arc<TokenKeys>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let verified = extract_bearer_token(req.headers().get(header::AUTHORIZATION))
        .and_then(|token| keys.verify(token));

    let identity = match verified {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!(path = %req.uri().path(), reason = e.reason(), "Authentication refused");
            metrics::record_auth_failure(e.reason());
            return Err(e.into());
        }
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
