// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the auth gate, session persistence and the mock service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures of user-initiated auth operations (login, register, password reset).
///
/// None of these are fatal: callers render [`AuthError::display_message`]
/// inline and keep running.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Auth service error ({status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Malformed auth service response: {0}")]
    MalformedResponse(String),

    #[error("Unexpected auth failure: {0}")]
    UnknownError(String),

    #[error("Operation not supported by the active auth service: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Failed to persist session: {0}")]
    Persistence(#[from] PersistenceError),

    /// A logout happened while the request was in flight; its result was dropped.
    #[error("Signed out before the request completed")]
    SignedOut,
}

impl AuthError {
    pub const GENERIC_MESSAGE: &'static str = "Something went wrong. Please try again.";

    /// Normalize to the string shown next to the form.
    pub fn display_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::ServiceError { message, .. } if !message.trim().is_empty() => {
                message.clone()
            }
            AuthError::UnsupportedOperation(op) => {
                format!("{op} is not available right now")
            }
            AuthError::Persistence(_) => "Could not save your session on this device".to_string(),
            AuthError::SignedOut => "You were signed out. Please sign in again.".to_string(),
            AuthError::ServiceError { .. }
            | AuthError::MalformedResponse(_)
            | AuthError::UnknownError(_) => Self::GENERIC_MESSAGE.to_string(),
        }
    }
}

/// Session storage failures.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Mock auth service error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0} is not implemented by this service")]
    NotImplemented(&'static str),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body.
///
/// `message` is what the client shows to the user.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::NotImplemented(_) => (StatusCode::NOT_IMPLEMENTED, "not_implemented"),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let message = match &self {
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::BadRequest(msg) | AppError::Conflict(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
