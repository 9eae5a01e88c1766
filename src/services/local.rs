//! In-process mock of the auth service, backed by a [`UserDirectory`].

use std::sync::Arc;

use validator::Validate;

use crate::error::AuthError;
use crate::models::User;
use crate::services::auth_api::{
    validation_message, AuthApi, AuthResponse, ForgotPasswordRequest, LoginRequest,
    RegisterRequest,
};
use crate::services::directory::{DirectoryError, UserDirectory};

/// Mock auth service that answers from a directory in this process.
#[derive(Clone)]
pub struct LocalAuthApi {
    directory: Arc<UserDirectory>,
}

impl LocalAuthApi {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Arc<UserDirectory> {
        &self.directory
    }
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::InvalidCredentials => AuthError::InvalidCredentials,
            DirectoryError::EmailTaken => AuthError::ServiceError {
                status: 409,
                message: err.to_string(),
            },
            DirectoryError::InvalidToken => AuthError::ServiceError {
                status: 401,
                message: err.to_string(),
            },
            DirectoryError::ResetDisabled => AuthError::UnsupportedOperation("Password reset"),
            DirectoryError::Signing(_) | DirectoryError::Clock(_) | DirectoryError::Digest(_) => {
                AuthError::UnknownError(err.to_string())
            }
        }
    }
}

fn check<T: Validate>(request: &T) -> Result<(), AuthError> {
    request.validate().map_err(|e| AuthError::ServiceError {
        status: 400,
        message: validation_message(&e),
    })
}

impl AuthApi for LocalAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        check(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let (user, token) = self.directory.authenticate(email, password)?;
        Ok(AuthResponse { token, user })
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        check(&RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let (user, token) = self.directory.register(name, email, password)?;
        Ok(AuthResponse { token, user })
    }

    async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        check(&ForgotPasswordRequest {
            email: email.to_string(),
        })?;
        Ok(self.directory.request_password_reset(email)?)
    }

    async fn get_profile(&self, token: &str) -> Result<User, AuthError> {
        Ok(self.directory.profile(token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(reset_enabled: bool) -> LocalAuthApi {
        let directory = UserDirectory::new(b"test_signing_key_32_bytes_long!!", b"pepper", reset_enabled);
        directory.seed_demo_accounts().unwrap();
        LocalAuthApi::new(Arc::new(directory))
    }

    #[tokio::test]
    async fn test_login_and_profile() {
        let api = api(true);
        let response = api.login("user@mailcheck.test", "user123").await.unwrap();
        let profile = api.get_profile(&response.token).await.unwrap();
        assert_eq!(profile.id, response.user.id);
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let err = api(true).login("a@b.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_register_validation_is_service_error() {
        let err = api(true)
            .register("", "grace@example.com", "cobol1959")
            .await
            .unwrap_err();
        assert_eq!(err.display_message(), "Name is required");
    }

    #[tokio::test]
    async fn test_duplicate_registration_message() {
        let err = api(true)
            .register("Another", "admin@mailcheck.test", "secret99")
            .await
            .unwrap_err();
        assert_eq!(
            err.display_message(),
            "An account with this email already exists"
        );
    }

    #[tokio::test]
    async fn test_reset_disabled_is_unsupported() {
        let err = api(false)
            .forgot_password("user@mailcheck.test")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedOperation(_)));
        assert!(api(true).forgot_password("user@mailcheck.test").await.is_ok());
    }
}
