// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route constants and the navigation seam used by the auth gate.

use std::sync::{Mutex, PoisonError};

use crate::models::Role;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const ADMIN_PATH: &str = "/admin";

/// Where a user with `role` lands after login or restore.
pub fn landing_for(role: Role) -> &'static str {
    match role {
        Role::Admin => ADMIN_PATH,
        Role::User => DASHBOARD_PATH,
    }
}

/// True for `/admin` and anything below it, but not `/administrator`.
pub fn is_admin_path(path: &str) -> bool {
    path.strip_prefix(ADMIN_PATH)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
}

pub fn is_login_path(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path == LOGIN_PATH || path == "/login/"
}

/// Reads the current location and performs redirects.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    fn redirect(&self, to: &str);
}

/// Navigator that keeps its location in memory and records every redirect.
#[derive(Debug)]
pub struct HistoryNavigator {
    state: Mutex<History>,
}

#[derive(Debug)]
struct History {
    current: String,
    redirects: Vec<String>,
}

impl HistoryNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(History {
                current: start.into(),
                redirects: Vec::new(),
            }),
        }
    }

    /// Redirects performed so far, oldest first.
    pub fn redirects(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .redirects
            .clone()
    }

    /// Move to `path` without it counting as a redirect.
    pub fn visit(&self, path: impl Into<String>) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).current = path.into();
    }
}

impl Navigator for HistoryNavigator {
    fn current_path(&self) -> String {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    fn redirect(&self, to: &str) {
        tracing::debug!(to, "Redirecting");
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.current = to.to_string();
        state.redirects.push(to.to_string());
    }
}

impl<T: Navigator + ?Sized> Navigator for std::sync::Arc<T> {
    fn current_path(&self) -> String {
        (**self).current_path()
    }

    fn redirect(&self, to: &str) {
        (**self).redirect(to);
    }
}
