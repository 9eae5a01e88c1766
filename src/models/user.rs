//! User model shared by the session, the auth service client and the mock service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Account role. Decides where a user lands after login or restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// Identity record as held by the client session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Remaining verification credits
    #[serde(default)]
    pub credits: i64,
    /// Missing on the wire for some backends; see [`User::normalized`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Session token, attached by the client after login or restore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// When the account was created (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Fields this client does not model, kept so they survive persistence.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Apply the login normalization rule: a missing role means `user`.
    pub fn normalized(mut self) -> Self {
        self.role.get_or_insert(Role::User);
        self
    }

    /// Attach the session token to the record.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Role used for navigation decisions.
    pub fn effective_role(&self) -> Role {
        self.role.unwrap_or_default()
    }

    pub fn is_admin(&self) -> bool {
        self.effective_role() == Role::Admin
    }

    /// Merge partial fields into this record. Nothing is validated.
    pub fn apply_patch(&mut self, patch: UserPatch) {
        let UserPatch {
            name,
            email,
            credits,
            role,
            company,
            phone,
            avatar_url,
            extra,
        } = patch;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(credits) = credits {
            self.credits = credits;
        }
        if role.is_some() {
            self.role = role;
        }
        if company.is_some() {
            self.company = company;
        }
        if phone.is_some() {
            self.phone = phone;
        }
        if avatar_url.is_some() {
            self.avatar_url = avatar_url;
        }
        self.extra.extend(extra);
    }
}

/// Partial user fields for profile edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
