// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP auth client against a live mock service on an ephemeral port.

use mailcheck_portal::auth::AuthGate;
use mailcheck_portal::config::Config;
use mailcheck_portal::error::AuthError;
use mailcheck_portal::models::Role;
use mailcheck_portal::navigation::{HistoryNavigator, Navigator};
use mailcheck_portal::persistence::{MemorySessionStore, SessionPersistence};
use mailcheck_portal::services::{AuthApi, HttpAuthApi, UserDirectory};
use mailcheck_portal::AppState;
use std::sync::Arc;
use std::time::Duration;

mod common;

async fn client() -> HttpAuthApi {
    let base_url = common::spawn_test_server(common::test_state()).await;
    HttpAuthApi::new(&base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_login_and_profile() {
    let api = client().await;

    let session = api.login("user@mailcheck.test", "user123").await.unwrap();
    assert_eq!(session.user.email, "user@mailcheck.test");

    let profile = api.get_profile(&session.token).await.unwrap();
    assert_eq!(profile.id, "usr_demo_user");
    assert_eq!(profile.credits, 500);
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let api = client().await;

    let err = api.login("user@mailcheck.test", "nope").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(err.display_message(), "Invalid email or password");
}

#[tokio::test]
async fn test_duplicate_registration_shows_service_message() {
    let api = client().await;

    let err = api
        .register("Again", "user@mailcheck.test", "secret1")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::ServiceError { status: 409, .. }));
    assert_eq!(
        err.display_message(),
        "An account with this email already exists"
    );
}

#[tokio::test]
async fn test_register_returns_usable_token() {
    let api = client().await;

    let session = api
        .register("Grace", "grace@example.com", "secret1")
        .await
        .unwrap();
    let profile = api.get_profile(&session.token).await.unwrap();

    assert_eq!(profile.name, "Grace");
    assert_eq!(profile.effective_role(), Role::User);
}

#[tokio::test]
async fn test_bad_token_profile_is_service_error() {
    let api = client().await;

    let err = api.get_profile("garbage").await.unwrap_err();

    assert!(matches!(err, AuthError::ServiceError { status: 401, .. }));
}

#[tokio::test]
async fn test_forgot_password() {
    let api = client().await;
    api.forgot_password("user@mailcheck.test").await.unwrap();

    let mut config = Config::test_default();
    config.forgot_password_enabled = false;
    let directory = UserDirectory::from_config(&config).unwrap();
    let base_url =
        common::spawn_test_server(Arc::new(AppState { config, directory })).await;
    let api = HttpAuthApi::new(&base_url, Duration::from_secs(5)).unwrap();

    let err = api.forgot_password("user@mailcheck.test").await.unwrap_err();
    assert!(matches!(err, AuthError::UnsupportedOperation(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_unknown_error() {
    // Bind and drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpAuthApi::new(&format!("http://{addr}/api"), Duration::from_secs(2)).unwrap();
    let err = api.login("user@mailcheck.test", "user123").await.unwrap_err();

    assert!(matches!(err, AuthError::UnknownError(_)));
    assert_eq!(err.display_message(), AuthError::GENERIC_MESSAGE);
}

#[tokio::test]
async fn test_gate_end_to_end() {
    let api = Arc::new(client().await);
    let store = MemorySessionStore::new();

    let navigator = Arc::new(HistoryNavigator::new("/login"));
    let gate = AuthGate::new(api.clone(), store.clone(), navigator.clone());
    gate.login("admin@mailcheck.test", "admin123").await.unwrap();
    assert_eq!(navigator.current_path(), "/admin");

    // A fresh start on an admin page keeps the admin there.
    let navigator = Arc::new(HistoryNavigator::new("/admin/users"));
    let gate = AuthGate::new(api, store.clone(), navigator.clone());
    let session = gate.restore().await;

    assert!(session.is_authenticated());
    assert!(session.user().unwrap().is_admin());
    assert!(navigator.redirects().is_empty());
    assert!(store.load().is_some());
}
