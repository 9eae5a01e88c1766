// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the auth/profile service.
//!
//! Handles:
//! - Login and registration (token + user in the response body)
//! - Password reset requests
//! - Profile lookup by bearer token
//! - Mapping status codes and error bodies onto [`AuthError`]

use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::AuthError;
use crate::models::User;
use crate::services::auth_api::{
    AuthApi, AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest,
};

/// Which call a response belongs to; some statuses mean different things per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Login,
    Register,
    ForgotPassword,
    Profile,
}

/// Auth service API client.
#[derive(Clone)]
pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Create a client for the service rooted at `base_url` (e.g. `https://host/api`).
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building auth service HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and parse a token + user response.
    async fn post_for_session<B: serde::Serialize + ?Sized>(
        &self,
        call: Call,
        path: &str,
        body: &B,
    ) -> Result<AuthResponse, AuthError> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::UnknownError(format!("Request failed: {e}")))?;

        let response = check_response(call, response).await?;
        let body: SessionBody = response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(format!("JSON parse error: {e}")))?;

        body.into_auth_response()
    }
}

impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_for_session(Call::Login, "/auth/login", &body)
            .await
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_for_session(Call::Register, "/auth/register", &body)
            .await
    }

    async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        let response = self
            .http
            .post(self.url("/auth/forgot-password"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::UnknownError(format!("Request failed: {e}")))?;

        check_response(Call::ForgotPassword, response).await?;
        Ok(())
    }

    async fn get_profile(&self, token: &str) -> Result<User, AuthError> {
        let response = self
            .http
            .get(self.url("/auth/profile"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::UnknownError(format!("Request failed: {e}")))?;

        let response = check_response(Call::Profile, response).await?;
        let body: ProfileBody = response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(format!("JSON parse error: {e}")))?;

        Ok(body.into_user())
    }
}

/// Token + user, as returned by login and register.
#[derive(Deserialize)]
struct SessionBody {
    token: Option<String>,
    user: Option<User>,
}

impl SessionBody {
    fn into_auth_response(self) -> Result<AuthResponse, AuthError> {
        match (self.token, self.user) {
            (Some(token), Some(user)) if !token.is_empty() => Ok(AuthResponse { token, user }),
            (None, _) | (Some(_), Some(_)) => Err(AuthError::MalformedResponse(
                "response is missing the session token".to_string(),
            )),
            (Some(_), None) => Err(AuthError::MalformedResponse(
                "response is missing the user".to_string(),
            )),
        }
    }
}

/// Profile endpoints either return the user directly or wrap it as `{ "user": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileBody {
    Wrapped { user: User },
    Bare(User),
}

impl ProfileBody {
    fn into_user(self) -> User {
        match self {
            ProfileBody::Wrapped { user } | ProfileBody::Bare(user) => user,
        }
    }
}

/// Structured error body: `{ "message": ... }` and/or `{ "data": { "message": ... } }`.
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<ErrorData>,
}

#[derive(Deserialize)]
struct ErrorData {
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.data
            .and_then(|d| d.message)
            .or(self.message)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Check response status and turn failures into the matching [`AuthError`].
async fn check_response(
    call: Call,
    response: reqwest::Response,
) -> Result<reqwest::Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(error_from_status(call, status, &body))
}

fn error_from_status(call: Call, status: StatusCode, body: &str) -> AuthError {
    if call == Call::Login && status == StatusCode::UNAUTHORIZED {
        return AuthError::InvalidCredentials;
    }

    if call == Call::ForgotPassword
        && matches!(
            status,
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
        )
    {
        return AuthError::UnsupportedOperation("Password reset");
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message);

    match message {
        Some(message) => AuthError::ServiceError {
            status: status.as_u16(),
            message,
        },
        None => {
            tracing::warn!(?call, status = status.as_u16(), "Auth service returned an unstructured error");
            AuthError::UnknownError(format!("HTTP {status}"))
        }
    }
}
