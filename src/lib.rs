// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mailcheck portal: session bootstrap and auth gate for the email
//! verification dashboard.
//!
//! The [`auth::AuthGate`] owns the client session: it restores a persisted
//! credential bundle on startup, revalidates it against the auth/profile
//! service, and keeps navigation consistent with the user's role. The crate
//! also ships an HTTP client for that service and an in-process mock of it
//! that can be served over axum for local development.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod persistence;
pub mod routes;
pub mod services;

use config::Config;
use services::UserDirectory;

/// Shared state of the mock auth service.
pub struct AppState {
    pub config: Config,
    pub directory: UserDirectory,
}
