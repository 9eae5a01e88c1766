// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session bootstrap and auth gate.
//!
//! The gate is the single writer of the client session. Consumers read a
//! snapshot with [`AuthGate::session`] or follow changes through
//! [`AuthGate::subscribe`].
//!
//! Every change to the credentials replaces `{user, token}` in one step, so
//! observers never see a user without a token or the reverse. Login,
//! register and restore are serialized: a second submit waits for the first
//! to finish before sending its own request. A logout is never undone by a
//! request that was already in flight when it happened.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{watch, Mutex};

use crate::error::AuthError;
use crate::models::{Role, Session, StoredSession, User, UserPatch};
use crate::navigation::{
    is_admin_path, is_login_path, landing_for, Navigator, DASHBOARD_PATH, LOGIN_PATH,
};
use crate::persistence::SessionPersistence;
use crate::services::{AuthApi, AuthResponse};

/// Owns the client session and keeps navigation in line with it.
pub struct AuthGate<A, P, N> {
    api: A,
    storage: P,
    navigator: N,
    session: watch::Sender<Session>,
    /// Serializes restore/login/register.
    in_flight: Mutex<()>,
    restored: AtomicBool,
    /// Bumped by every logout; results of requests started earlier are dropped.
    logout_epoch: AtomicU64,
}

impl<A, P, N> AuthGate<A, P, N>
where
    A: AuthApi,
    P: SessionPersistence,
    N: Navigator,
{
    /// Create a gate with an anonymous session. Call [`AuthGate::restore`] once at startup.
    pub fn new(api: A, storage: P, navigator: N) -> Self {
        let (session, _) = watch::channel(Session::default());
        Self {
            api,
            storage,
            navigator,
            session,
            in_flight: Mutex::new(()),
            restored: AtomicBool::new(false),
            logout_epoch: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Receiver that is notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.session.borrow().user().cloned()
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Rehydrate the session from storage and revalidate it with the service.
    ///
    /// Runs once per gate; later calls return the current session untouched.
    /// Failures are silent: an invalid token clears storage and leaves the
    /// caller anonymous wherever they are.
    pub async fn restore(&self) -> Session {
        if self.restored.swap(true, Ordering::SeqCst) {
            tracing::debug!("Session restore already ran, skipping");
            return self.session();
        }

        let _guard = self.in_flight.lock().await;
        let epoch = self.logout_epoch.load(Ordering::SeqCst);
        self.set_loading(true);

        let Some(stored) = self.storage.load() else {
            tracing::debug!("No persisted session");
            self.commit(None);
            return self.session();
        };

        match self.api.get_profile(&stored.token).await {
            Ok(user) => {
                let user = user.with_token(&stored.token);
                let role = user.effective_role();
                let user_id = user.id.clone();
                let credentials = StoredSession {
                    user,
                    token: stored.token,
                };

                if self.commit_since(epoch, credentials) {
                    tracing::info!(%user_id, %role, "Session restored");
                    self.redirect_after_restore(role);
                } else {
                    tracing::info!(%user_id, "Logged out during restore, dropping profile");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Persisted session rejected, signing out");
                if let Err(e) = self.storage.clear() {
                    tracing::warn!(error = %e, "Failed to clear persisted session");
                }
                self.commit(None);
            }
        }

        self.session()
    }

    fn redirect_after_restore(&self, role: Role) {
        let path = self.navigator.current_path();
        if is_admin_path(&path) && role == Role::Admin {
            return;
        }
        if is_login_path(&path) {
            self.navigator.redirect(landing_for(role));
        }
    }

    /// Sign in and land on the page for the user's role.
    ///
    /// Inputs are expected to be validated by the caller. On any error the
    /// session is left exactly as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let _guard = self.in_flight.lock().await;
        let epoch = self.logout_epoch.load(Ordering::SeqCst);
        self.set_loading(true);

        let result = match self.api.login(email, password).await {
            Ok(response) => self.establish(response, true, epoch),
            Err(e) => Err(e),
        };

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.effective_role(), "Logged in");
                self.navigator.redirect(landing_for(user.effective_role()));
                Ok(user)
            }
            Err(e) => {
                tracing::info!(error = %e, "Login failed");
                self.set_loading(false);
                Err(e)
            }
        }
    }

    /// Create an account, sign in, and land on the dashboard.
    ///
    /// The returned user is trusted as-is; no role is filled in.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let _guard = self.in_flight.lock().await;
        let epoch = self.logout_epoch.load(Ordering::SeqCst);
        self.set_loading(true);

        let result = match self.api.register(name, email, password).await {
            Ok(response) => self.establish(response, false, epoch),
            Err(e) => Err(e),
        };

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Registered");
                self.navigator.redirect(DASHBOARD_PATH);
                Ok(user)
            }
            Err(e) => {
                tracing::info!(error = %e, "Registration failed");
                self.set_loading(false);
                Err(e)
            }
        }
    }

    /// Persist and commit a fresh session.
    ///
    /// Nothing is committed if saving fails or a logout happened after
    /// `epoch` was read.
    fn establish(
        &self,
        response: AuthResponse,
        normalize_role: bool,
        epoch: u64,
    ) -> Result<User, AuthError> {
        let AuthResponse { token, user } = response;
        if token.is_empty() {
            return Err(AuthError::MalformedResponse(
                "empty session token".to_string(),
            ));
        }

        let user = if normalize_role { user.normalized() } else { user };
        let credentials = StoredSession {
            user: user.with_token(&token),
            token,
        };

        if self.logout_epoch.load(Ordering::SeqCst) != epoch {
            return Err(AuthError::SignedOut);
        }
        self.storage.save(&credentials)?;

        let user = credentials.user.clone();
        if !self.commit_since(epoch, credentials) {
            // The logout may have cleared storage before our save landed.
            if let Err(e) = self.storage.clear() {
                tracing::warn!(error = %e, "Failed to clear persisted session");
            }
            return Err(AuthError::SignedOut);
        }
        Ok(user)
    }

    /// Drop the session everywhere and go to the login page.
    ///
    /// Requests still in flight will not commit their results afterwards.
    pub fn logout(&self) {
        // Bump before clearing so a concurrent save is either cleared here or
        // rolled back by its owner.
        self.logout_epoch.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "Failed to clear persisted session");
        }
        self.session.send_modify(|s| s.set_credentials(None));
        tracing::info!("Logged out");
        self.navigator.redirect(LOGIN_PATH);
    }

    /// Merge profile edits into the current user and persist them.
    ///
    /// Does nothing without a signed-in user. Returns the updated user.
    pub fn update_user(&self, patch: UserPatch) -> Option<User> {
        let mut snapshot = None;
        self.session.send_if_modified(|s| {
            let Some(user) = s.user_mut() else {
                return false;
            };
            user.apply_patch(patch);
            snapshot = s.credentials().cloned();
            true
        });

        let credentials = snapshot?;
        if let Err(e) = self.storage.save(&credentials) {
            tracing::warn!(error = %e, "Failed to persist profile update");
        }
        Some(credentials.user)
    }

    /// Ask the service to send a password reset email.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        self.api.forgot_password(email).await
    }

    fn set_loading(&self, loading: bool) {
        self.session.send_if_modified(|s| {
            let changed = s.is_loading != loading;
            s.is_loading = loading;
            changed
        });
    }

    /// Commit `credentials` unless a logout happened after `epoch` was read.
    ///
    /// Loading ends either way. Returns whether the credentials were committed.
    fn commit_since(&self, epoch: u64, credentials: StoredSession) -> bool {
        let mut committed = false;
        self.session.send_modify(|s| {
            s.is_loading = false;
            // Checked under the channel's write lock, so a logout either
            // bumped already or its own update lands after this one.
            if self.logout_epoch.load(Ordering::SeqCst) == epoch {
                s.set_credentials(Some(credentials));
                committed = true;
            }
        });
        committed
    }

    /// Replace the credentials and end loading in a single update.
    fn commit(&self, credentials: Option<StoredSession>) {
        self.session.send_modify(|s| {
            s.set_credentials(credentials);
            s.is_loading = false;
        });
    }
}
