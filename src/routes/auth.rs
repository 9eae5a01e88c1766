// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth routes of the mock service: login, registration, password reset, profile.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::User;
use crate::services::auth_api::{
    validation_message, ForgotPasswordRequest, LoginRequest, RegisterRequest,
};
use crate::services::DirectoryError;
use crate::AppState;

/// Routes that do not need a token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/forgot-password", post(forgot_password))
}

/// Routes behind the bearer auth middleware (applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/profile", get(profile))
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::InvalidCredentials => AppError::InvalidCredentials,
            DirectoryError::EmailTaken => AppError::Conflict(err.to_string()),
            DirectoryError::InvalidToken => AppError::InvalidToken,
            DirectoryError::ResetDisabled => AppError::NotImplemented("Password reset"),
            DirectoryError::Signing(_) | DirectoryError::Clock(_) | DirectoryError::Digest(_) => {
                AppError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

fn validate<T: Validate>(body: &T) -> Result<()> {
    body.validate()
        .map_err(|e| AppError::BadRequest(validation_message(&e)))
}

/// Token + user, returned by login and register.
#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

/// Acknowledgement with a message for the user.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Current user, returned by the profile lookup.
#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: User,
}

/// Exchange credentials for a session token.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    validate(&body)?;

    let (user, token) = state
        .directory
        .authenticate(&body.email, &body.password)
        .inspect_err(|e| tracing::info!(error = %e, "Login rejected"))?;

    Ok(Json(SessionResponse { token, user }))
}

/// Create an account and sign it in.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    validate(&body)?;

    let (user, token) = state
        .directory
        .register(&body.name, &body.email, &body.password)?;

    Ok((StatusCode::CREATED, Json(SessionResponse { token, user })))
}

/// Accept a password reset request without revealing whether the account exists.
async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    validate(&body)?;

    state.directory.request_password_reset(&body.email)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "If an account exists for this email, a reset link is on its way".to_string(),
        }),
    ))
}

/// Current user for the presented token.
async fn profile(Extension(auth): Extension<AuthUser>) -> Json<ProfileResponse> {
    Json(ProfileResponse { user: auth.user })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_errors_map_to_statuses() {
        use axum::response::IntoResponse;

        let cases = [
            (DirectoryError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (DirectoryError::EmailTaken, StatusCode::CONFLICT),
            (DirectoryError::InvalidToken, StatusCode::UNAUTHORIZED),
            (DirectoryError::ResetDisabled, StatusCode::NOT_IMPLEMENTED),
        ];
        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
