//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! issuance (auth handler set):
//!     credentials → password.rs (Argon2 verify) → token.rs (sign HS256)
//!
//! protected prefix:
//!     Authorization: Bearer <token>
//!     → guard.rs (extract, verify signature + expiry)
//!     → AuthUser attached to request extensions
//!     → handler (reads AuthUser)
//! ```
//!
//! Any guard failure becomes a 401 envelope before the handler runs.

pub mod guard;
pub mod password;
pub mod token;

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::http::error::ApiError;

pub use guard::require_auth;
pub use token::{Claims, TokenKeys};

/// Client-visible message for every credential failure.
pub const AUTH_INVALID: &str = "Authentication invalid";

/// Reasons a bearer credential is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingCredential,

    #[error("authorization header is not a bearer credential")]
    MalformedCredential,

    #[error("token signature or format invalid")]
    InvalidToken,

    #[error("token expired")]
    Expired,

    #[error("token subject is not a user id")]
    InvalidSubject,

    #[error("token signing failed")]
    Signing,
}

impl AuthError {
    /// Metric label for this failure.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing",
            AuthError::MalformedCredential => "malformed",
            AuthError::InvalidToken => "invalid",
            AuthError::Expired => "expired",
            AuthError::InvalidSubject => "subject",
            AuthError::Signing => "signing",
        }
    }

    pub fn client_message(&self) -> &'static str {
        AUTH_INVALID
    }
}

/// Identity attached to requests that passed the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthenticated(AUTH_INVALID.to_string()))
    }
}
