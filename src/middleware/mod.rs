// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware for the mock auth service (bearer auth, response headers).

pub mod auth;
pub mod security;

pub use auth::{require_auth, AuthUser};
pub use security::no_store_headers;
