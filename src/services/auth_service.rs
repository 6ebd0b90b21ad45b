//! Domain service for authentication and self-registration.

use thiserror::Error;

use crate::models::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Too many attempts, try again later")]
    RateLimited,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and returns the account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError>;

    /// Creates a regular account. Throttled per client.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RateLimited`], [`AuthError::Validation`] or
    /// [`AuthError::UsernameTaken`].
    async fn register(
        &self,
        username: &str,
        password: &str,
        client_key: &str,
    ) -> Result<User, AuthError>;

    /// Reloads the account behind a session.
    async fn current_user(&self, id: i32) -> Result<User, AuthError>;
}
