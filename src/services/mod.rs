// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - the auth/profile service and its implementations.

pub mod auth_api;
pub mod directory;
pub mod http;
pub mod local;

pub use auth_api::{ActiveAuthApi, AuthApi, AuthResponse};
pub use directory::{DirectoryError, UserDirectory};
pub use http::HttpAuthApi;
pub use local::LocalAuthApi;
