//! Client session state.

use serde::{Deserialize, Serialize};

use super::user::User;

/// The persisted credential bundle: a user and the token that authenticates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: User,
    pub token: String,
}

/// Current authentication state of the running client.
///
/// A session is either fully authenticated or fully anonymous: user and
/// token live together in one `Option`, so one cannot be set without the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    credentials: Option<StoredSession>,
    /// Set while restore, login or register is waiting on the service.
    pub is_loading: bool,
}

impl Session {
    pub fn authenticated(credentials: StoredSession) -> Self {
        Self {
            credentials: Some(credentials),
            is_loading: false,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.credentials.as_ref().map(|c| &c.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.token.as_str())
    }

    pub fn credentials(&self) -> Option<&StoredSession> {
        self.credentials.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub(crate) fn set_credentials(&mut self, credentials: Option<StoredSession>) {
        self.credentials = credentials;
    }

    pub(crate) fn user_mut(&mut self) -> Option<&mut User> {
        self.credentials.as_mut().map(|c| &mut c.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_anonymous() {
        let session = Session::default();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert!(session.token().is_none());
        assert!(!session.is_loading);
    }

    #[test]
    fn test_user_and_token_travel_together() {
        let user: User = serde_json::from_value(json!({
            "id": "u1", "name": "Ada", "email": "ada@example.com"
        }))
        .unwrap();
        let mut session = Session::authenticated(StoredSession {
            user,
            token: "t1".to_string(),
        });
        assert_eq!(session.token(), Some("t1"));
        assert_eq!(session.user().map(|u| u.id.as_str()), Some("u1"));

        session.set_credentials(None);
        assert!(session.user().is_none());
        assert!(session.token().is_none());
    }
}
