// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use mailcheck_portal::auth::AuthGate;
use mailcheck_portal::config::Config;
use mailcheck_portal::error::{AuthError, PersistenceError};
use mailcheck_portal::models::{Role, StoredSession, User};
use mailcheck_portal::navigation::HistoryNavigator;
use mailcheck_portal::persistence::{MemorySessionStore, SessionPersistence};
use mailcheck_portal::routes::create_router;
use mailcheck_portal::services::{AuthApi, AuthResponse, UserDirectory};
use mailcheck_portal::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type TestGate = AuthGate<Arc<StubAuthApi>, MemorySessionStore, Arc<HistoryNavigator>>;

/// Build a user record; `role: None` leaves the role off the record.
#[allow(dead_code)]
pub fn user(id: &str, role: Option<Role>) -> User {
    let mut value = serde_json::json!({
        "id": id,
        "name": format!("User {id}"),
        "email": format!("{id}@example.com"),
        "credits": 42
    });
    if let Some(role) = role {
        value["role"] = serde_json::json!(role);
    }
    serde_json::from_value(value).expect("valid user json")
}

#[allow(dead_code)]
pub fn stored(user: User, token: &str) -> StoredSession {
    StoredSession {
        user: user.with_token(token),
        token: token.to_string(),
    }
}

/// Scripted auth service.
#[allow(dead_code)]
#[derive(Default)]
pub struct StubAuthApi {
    accounts: Mutex<HashMap<(String, String), AuthResponse>>,
    profiles: Mutex<HashMap<String, User>>,
    register_response: Mutex<Option<AuthResponse>>,
    login_error: Mutex<Option<fn() -> AuthError>>,
    delay: Mutex<Option<Duration>>,
    pub login_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl StubAuthApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Accept `email`/`password` and answer with `user` + `token`.
    pub fn with_account(&self, email: &str, password: &str, user: User, token: &str) {
        self.accounts.lock().unwrap().insert(
            (email.to_string(), password.to_string()),
            AuthResponse {
                token: token.to_string(),
                user,
            },
        );
    }

    /// Make `token` resolve to `user` on profile lookup.
    pub fn with_profile(&self, token: &str, user: User) {
        self.profiles.lock().unwrap().insert(token.to_string(), user);
    }

    pub fn with_register_response(&self, user: User, token: &str) {
        *self.register_response.lock().unwrap() = Some(AuthResponse {
            token: token.to_string(),
            user,
        });
    }

    /// Every login fails with the error `make` builds.
    pub fn with_login_error(&self, make: fn() -> AuthError) {
        *self.login_error.lock().unwrap() = Some(make);
    }

    pub fn with_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AuthApi for StubAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        let error = *self.login_error.lock().unwrap();
        let result = match error {
            Some(make) => Err(make()),
            None => self
                .accounts
                .lock()
                .unwrap()
                .get(&(email.to_string(), password.to_string()))
                .cloned()
                .ok_or(AuthError::InvalidCredentials),
        };
        self.leave();
        result
    }

    async fn register(
        &self,
        _name: &str,
        _email: &str,
        _password: &str,
    ) -> Result<AuthResponse, AuthError> {
        self.enter().await;
        let result = self
            .register_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AuthError::ServiceError {
                status: 409,
                message: "An account with this email already exists".to_string(),
            });
        self.leave();
        result
    }

    async fn get_profile(&self, token: &str) -> Result<User, AuthError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        let result = self
            .profiles
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::ServiceError {
                status: 401,
                message: "Invalid or expired token".to_string(),
            });
        self.leave();
        result
    }
}

/// Storage whose writes always fail.
#[allow(dead_code)]
#[derive(Default)]
pub struct ReadOnlyStore {
    pub inner: MemorySessionStore,
}

impl SessionPersistence for ReadOnlyStore {
    fn load(&self) -> Option<StoredSession> {
        self.inner.load()
    }

    fn save(&self, _session: &StoredSession) -> Result<(), PersistenceError> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
    }
}

/// Gate over a stub service and in-memory storage, starting at `path`.
#[allow(dead_code)]
pub fn test_gate(
    api: &Arc<StubAuthApi>,
    store: &MemorySessionStore,
    path: &str,
) -> (TestGate, Arc<HistoryNavigator>) {
    let navigator = Arc::new(HistoryNavigator::new(path));
    let gate = AuthGate::new(api.clone(), store.clone(), navigator.clone());
    (gate, navigator)
}

/// Shared state for the mock service with demo accounts.
#[allow(dead_code)]
pub fn test_state() -> Arc<AppState> {
    let config = Config::test_default();
    let directory = UserDirectory::from_config(&config).expect("demo accounts seed");
    Arc::new(AppState { config, directory })
}

/// Create a test app with the mock service.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state();
    (create_router(state.clone()), state)
}

/// Serve the mock service on an ephemeral port; returns its API base URL.
#[allow(dead_code)]
pub async fn spawn_test_server(state: Arc<AppState>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let app = create_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}/api")
}
