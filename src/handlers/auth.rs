//! Credential issuance: register and login.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::http::error::ApiError;
use crate::http::extract::{JsonBody, ValidJson};
use crate::http::server::AppState;
use crate::storage::{NewUser, User};

pub const MISSING_CREDENTIALS: &str = "Please provide email and password";
pub const INVALID_CREDENTIALS: &str = "Invalid Credentials";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 50, message = "Please provide a name between 3 and 50 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Please provide a password of at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub token: String,
}

impl AuthResponse {
    fn issue(state: &AppState, user: &User) -> Result<Self, ApiError> {
        Ok(Self {
            user: UserSummary {
                name: user.name.clone(),
            },
            token: state.tokens.issue(user.id, &user.name)?,
        })
    }
}

async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = state
        .storage
        .users
        .insert_user(NewUser {
            name: req.name,
            email: req.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Registered user");
    Ok((StatusCode::CREATED, Json(AuthResponse::issue(&state, &user)?)))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(MISSING_CREDENTIALS.to_string()));
    }

    let invalid = || ApiError::Unauthenticated(INVALID_CREDENTIALS.to_string());

    let user = state
        .storage
        .users
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    let password = req.password;
    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if !matches {
        return Err(invalid());
    }

    Ok(Json(AuthResponse::issue(&state, &user)?))
}
