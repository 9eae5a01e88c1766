// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Configuration loaded from environment variables.
//!
//! Client commands only need to know where the auth service lives and where
//! to keep the session file. Serving (or using) the mock service also needs
//! the token signing key and the password pepper.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Which auth/profile service the gate talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthBackend {
    /// Remote service over HTTP.
    Http,
    /// In-process mock service.
    Local,
}

impl std::str::FromStr for AuthBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(AuthBackend::Http),
            "local" | "mock" => Ok(AuthBackend::Local),
            other => Err(ConfigError::Invalid("AUTH_BACKEND", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Client side ---
    /// Active auth service implementation
    pub auth_backend: AuthBackend,
    /// Base URL of the auth service API (e.g. `http://host/api`)
    pub auth_api_url: String,
    /// Timeout for each auth service request
    pub http_timeout: Duration,
    /// Directory holding the persisted session
    pub session_dir: PathBuf,

    // --- Mock service ---
    /// Server port
    pub port: u16,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// JWT signing key for issued tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for password digests
    pub password_pepper: Vec<u8>,
    /// Whether the mock service supports password reset requests
    pub forgot_password_enabled: bool,
    /// Seed the directory with the demo admin and user accounts
    pub seed_demo_accounts: bool,
}

impl Config {
    pub const DEFAULT_API_URL: &'static str = "http://127.0.0.1:8080/api";
    pub const DEFAULT_SESSION_DIR: &'static str = ".mailcheck";

    /// Load configuration from environment variables.
    ///
    /// The signing key and pepper are only required when the mock service is
    /// used; client-only configurations leave them empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let auth_backend = match env::var("AUTH_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => AuthBackend::Http,
        };

        Ok(Self {
            auth_backend,
            auth_api_url: env::var("AUTH_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| Self::DEFAULT_API_URL.to_string()),
            http_timeout: Duration::from_secs(parse_or("AUTH_HTTP_TIMEOUT_SECS", 10)?),
            session_dir: env::var("SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(Self::DEFAULT_SESSION_DIR)),
            port: parse_or("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map(|v| v.trim().as_bytes().to_vec())
                .unwrap_or_default(),
            password_pepper: env::var("PASSWORD_PEPPER")
                .map(|v| v.trim().as_bytes().to_vec())
                .unwrap_or_default(),
            forgot_password_enabled: parse_or("FORGOT_PASSWORD_ENABLED", true)?,
            seed_demo_accounts: parse_or("SEED_DEMO_ACCOUNTS", false)?,
        })
    }

    /// Check that the secrets the mock service needs are present.
    pub fn require_service_secrets(&self) -> Result<(), ConfigError> {
        if self.jwt_signing_key.is_empty() {
            return Err(ConfigError::Missing("JWT_SIGNING_KEY"));
        }
        if self.password_pepper.is_empty() {
            return Err(ConfigError::Missing("PASSWORD_PEPPER"));
        }
        Ok(())
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            auth_backend: AuthBackend::Local,
            auth_api_url: Self::DEFAULT_API_URL.to_string(),
            http_timeout: Duration::from_secs(5),
            session_dir: PathBuf::from(Self::DEFAULT_SESSION_DIR),
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            password_pepper: b"test_password_pepper".to_vec(),
            forgot_password_enabled: true,
            seed_demo_accounts: true,
        }
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
