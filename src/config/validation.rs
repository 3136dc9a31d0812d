//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required secrets and connection strings are present
//! - Validate value ranges (window > 0, max > 0)
//! - Detect malformed or overlapping route prefixes
//! - Reject CORS origins that cannot be sent as a header value
//!
//! Returns every problem found, not just the first.

use std::fmt;

use axum::http::HeaderValue;

use crate::config::schema::AppConfig;
use crate::routing::RouteTable;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.storage.uri.trim().is_empty() {
        errors.push(ValidationError::new(
            "storage.uri",
            "storage connection string is required (STORAGE_URI or MONGO_URI)",
        ));
    }

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::new(
            "auth.jwt_secret",
            "token signing secret is required (JWT_SECRET)",
        ));
    }

    if config.auth.token_lifetime_secs == 0 {
        errors.push(ValidationError::new(
            "auth.token_lifetime_secs",
            "must be greater than zero",
        ));
    }

    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.window_secs",
            "must be greater than zero",
        ));
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new(
            "rate_limit.max_requests",
            "must be greater than zero",
        ));
    }

    if config.security.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "security.max_body_bytes",
            "must be greater than zero",
        ));
    }

    for origin in &config.security.allowed_origins {
        if origin.trim().is_empty() || HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::new(
                "security.allowed_origins",
                format!("invalid origin {origin:?}"),
            ));
        }
    }

    if let Err(e) = RouteTable::new(&config.routes.api_prefix, &config.routes.docs_path) {
        errors.push(ValidationError::new("routes", e.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
