// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory account directory behind the mock auth service.
//!
//! Accounts are keyed by normalized email. Passwords are kept as
//! HMAC-SHA256 digests under a server-side pepper, and sessions are HS256
//! JWTs whose subject is the account id.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Config;
use crate::models::{Role, User};

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of issued session tokens (30 days).
const TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Credits granted to a newly registered account.
pub const SIGNUP_CREDITS: i64 = 100;

/// Demo accounts: (id, name, email, password, role, credits).
const DEMO_ACCOUNTS: [(&str, &str, &str, &str, Role, i64); 2] = [
    (
        "usr_demo_admin",
        "Demo Admin",
        "admin@mailcheck.test",
        "admin123",
        Role::Admin,
        1_000_000,
    ),
    (
        "usr_demo_user",
        "Demo User",
        "user@mailcheck.test",
        "user123",
        Role::User,
        500,
    ),
];

/// JWT claims for issued session tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account id)
    pub sub: String,
    /// Role at issue time
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Directory failures.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password reset is disabled")]
    ResetDisabled,

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("System time error: {0}")]
    Clock(#[from] std::time::SystemTimeError),

    #[error("Password digest failed: {0}")]
    Digest(#[from] hmac::digest::InvalidLength),
}

struct Account {
    user: User,
    password_digest: Vec<u8>,
}

/// Registered accounts and the keys used to authenticate them.
pub struct UserDirectory {
    /// Accounts keyed by normalized email
    accounts: DashMap<String, Account>,
    /// Account id -> normalized email
    ids: DashMap<String, String>,
    signing_key: Vec<u8>,
    password_pepper: Vec<u8>,
    forgot_password_enabled: bool,
}

impl UserDirectory {
    pub fn new(signing_key: &[u8], password_pepper: &[u8], forgot_password_enabled: bool) -> Self {
        Self {
            accounts: DashMap::new(),
            ids: DashMap::new(),
            signing_key: signing_key.to_vec(),
            password_pepper: password_pepper.to_vec(),
            forgot_password_enabled,
        }
    }

    /// Build a directory from configuration, seeding demo accounts if asked.
    pub fn from_config(config: &Config) -> Result<Self, DirectoryError> {
        let directory = Self::new(
            &config.jwt_signing_key,
            &config.password_pepper,
            config.forgot_password_enabled,
        );
        if config.seed_demo_accounts {
            directory.seed_demo_accounts()?;
        }
        Ok(directory)
    }

    /// Insert the demo admin and user accounts (stable ids, so tokens survive restarts).
    pub fn seed_demo_accounts(&self) -> Result<(), DirectoryError> {
        for (id, name, email, password, role, credits) in DEMO_ACCOUNTS {
            let user = User {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                credits,
                role: Some(role),
                token: None,
                company: None,
                phone: None,
                avatar_url: None,
                created_at: None,
                extra: Default::default(),
            };
            self.insert(user, password)?;
        }
        tracing::info!(count = DEMO_ACCOUNTS.len(), "Seeded demo accounts");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Verify credentials and issue a session token.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<(User, String), DirectoryError> {
        let key = normalize_email(email);
        let user = {
            let account = self
                .accounts
                .get(&key)
                .ok_or(DirectoryError::InvalidCredentials)?;

            let digest = self.digest(&key, password)?;
            if !bool::from(digest.as_slice().ct_eq(account.password_digest.as_slice())) {
                return Err(DirectoryError::InvalidCredentials);
            }
            account.user.clone()
        };

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, "Login succeeded");
        Ok((user, token))
    }

    /// Create an account and issue its first session token.
    pub fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), DirectoryError> {
        let key = normalize_email(email);
        let user = User {
            id: format!("usr_{}", uuid::Uuid::new_v4().simple()),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            credits: SIGNUP_CREDITS,
            role: Some(Role::User),
            token: None,
            company: None,
            phone: None,
            avatar_url: None,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            extra: Default::default(),
        };

        let password_digest = self.digest(&key, password)?;
        match self.accounts.entry(key.clone()) {
            Entry::Occupied(_) => return Err(DirectoryError::EmailTaken),
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    user: user.clone(),
                    password_digest,
                });
            }
        }
        self.ids.insert(user.id.clone(), key);

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, "Account registered");
        Ok((user, token))
    }

    /// Look up the account a token was issued for.
    pub fn profile(&self, token: &str) -> Result<User, DirectoryError> {
        let claims = self.verify_token(token)?;
        let key = self
            .ids
            .get(&claims.sub)
            .map(|k| k.value().clone())
            .ok_or(DirectoryError::InvalidToken)?;
        self.accounts
            .get(&key)
            .map(|account| account.user.clone())
            .ok_or(DirectoryError::InvalidToken)
    }

    /// Accept a password reset request. Unknown emails are accepted silently.
    pub fn request_password_reset(&self, email: &str) -> Result<(), DirectoryError> {
        if !self.forgot_password_enabled {
            return Err(DirectoryError::ResetDisabled);
        }
        let known = self.accounts.contains_key(&normalize_email(email));
        tracing::info!(known, "Password reset requested");
        Ok(())
    }

    /// Decode and validate a session token.
    pub fn verify_token(&self, token: &str) -> Result<Claims, DirectoryError> {
        let key = DecodingKey::from_secret(&self.signing_key);
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|_| DirectoryError::InvalidToken)
    }

    fn insert(&self, user: User, password: &str) -> Result<(), DirectoryError> {
        let key = normalize_email(&user.email);
        let password_digest = self.digest(&key, password)?;
        self.ids.insert(user.id.clone(), key.clone());
        self.accounts.insert(
            key,
            Account {
                user,
                password_digest,
            },
        );
        Ok(())
    }

    fn issue_token(&self, user: &User) -> Result<String, DirectoryError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let claims = Claims {
            sub: user.id.clone(),
            role: user.effective_role(),
            iat: now as usize,
            exp: (now + TOKEN_TTL_SECS) as usize,
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )?)
    }

    /// Peppered digest of `password`, salted with the account's normalized email.
    fn digest(&self, email_key: &str, password: &str) -> Result<Vec<u8>, DirectoryError> {
        let mut mac = HmacSha256::new_from_slice(&self.password_pepper)?;
        mac.update(email_key.as_bytes());
        mac.update(&[0]);
        mac.update(password.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Emails compare case-insensitively and ignore surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
