// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contract of the external auth/profile service.
//!
//! The gate only depends on [`AuthApi`]. [`ActiveAuthApi`] picks the
//! implementation at startup: the remote service over HTTP or the
//! in-process mock.

use std::future::Future;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AuthError;
use crate::models::User;
use crate::services::http::HttpAuthApi;
use crate::services::local::LocalAuthApi;

/// Successful login or registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, max = 120, message = "Name is required"),
        custom(function = "not_blank", message = "Name is required")
    )]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Rejects values that are empty once surrounding whitespace is trimmed.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Password reset request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
}

/// Pick one user-facing message out of a set of validation failures.
///
/// Messages are sorted so the choice does not depend on map order.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map_or_else(|| format!("{field} is invalid"), |m| m.to_string())
            })
        })
        .collect();
    messages.sort();
    messages
        .into_iter()
        .next()
        .unwrap_or_else(|| "Invalid request".to_string())
}

/// External auth/profile service.
pub trait AuthApi: Send + Sync {
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthResponse, AuthError>> + Send;

    fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthResponse, AuthError>> + Send;

    /// Request a password reset email.
    ///
    /// Backends without the capability keep this default.
    fn forgot_password(&self, email: &str) -> impl Future<Output = Result<(), AuthError>> + Send {
        let _ = email;
        async { Err(AuthError::UnsupportedOperation("Password reset")) }
    }

    /// Exchange a token for the current user's record. Any error means the
    /// token is no longer valid.
    fn get_profile(&self, token: &str) -> impl Future<Output = Result<User, AuthError>> + Send;
}

impl<T: AuthApi> AuthApi for std::sync::Arc<T> {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        (**self).login(email, password).await
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        (**self).register(name, email, password).await
    }

    async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        (**self).forgot_password(email).await
    }

    async fn get_profile(&self, token: &str) -> Result<User, AuthError> {
        (**self).get_profile(token).await
    }
}

/// The auth service selected by configuration.
pub enum ActiveAuthApi {
    Http(HttpAuthApi),
    Local(LocalAuthApi),
}

impl AuthApi for ActiveAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        match self {
            ActiveAuthApi::Http(api) => api.login(email, password).await,
            ActiveAuthApi::Local(api) => api.login(email, password).await,
        }
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        match self {
            ActiveAuthApi::Http(api) => api.register(name, email, password).await,
            ActiveAuthApi::Local(api) => api.register(name, email, password).await,
        }
    }

    async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        match self {
            ActiveAuthApi::Http(api) => api.forgot_password(email).await,
            ActiveAuthApi::Local(api) => api.forgot_password(email).await,
        }
    }

    async fn get_profile(&self, token: &str) -> Result<User, AuthError> {
        match self {
            ActiveAuthApi::Http(api) => api.get_profile(token).await,
            ActiveAuthApi::Local(api) => api.get_profile(token).await,
        }
    }
}
