// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod session;
pub mod user;

pub use session::{Session, StoredSession};
pub use user::{Role, User, UserPatch};
