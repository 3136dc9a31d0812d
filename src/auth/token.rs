//! Bearer token issuance and verification.

use std::time::Duration;

use axum::http::HeaderValue;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthError, AuthUser};

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id.
    pub sub: String,
    /// Display name.
    pub name: String,
    pub iat: u64,
    pub exp: u64,
}

/// Signing and verification keys derived from the server-held secret.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenKeys {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    /// Issue a signed token for `user_id`.
    pub fn issue(&self, user_id: Uuid, name: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            iat: now,
            exp: now + self.lifetime.as_secs(),
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims with the server key.
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "Token signing failed");
            AuthError::Signing
        })
    }

    /// Verify signature and expiry, returning the decoded identity.
    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Token validation failed");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSubject)?;
        Ok(AuthUser {
            user_id,
            name: data.claims.name,
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    let value = header
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MalformedCredential),
    }
}
