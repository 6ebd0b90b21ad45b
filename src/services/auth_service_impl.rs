//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{Store, UserChanges};
use crate::models::User;
use crate::services::auth_service::{AuthError, AuthService};
use crate::services::input::{sanitize_input, validate_strong_password};
use crate::services::rate_limit::RateLimiter;

const MIN_USERNAME_CHARS: usize = 3;

pub struct SeaOrmAuthService {
    store: Store,
    register_limiter: RateLimiter,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, register_limiter: RateLimiter, security: SecurityConfig) -> Self {
        Self {
            store,
            register_limiter,
            security,
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        self.store
            .verify_user_password(username.trim(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
        client_key: &str,
    ) -> Result<User, AuthError> {
        if !self.register_limiter.check(client_key).await {
            return Err(AuthError::RateLimited);
        }

        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let username = sanitize_input(username);
        if username.chars().count() < MIN_USERNAME_CHARS {
            return Err(AuthError::Validation(format!(
                "Username must be at least {MIN_USERNAME_CHARS} characters"
            )));
        }

        validate_strong_password(password, self.security.min_password_length)
            .map_err(AuthError::Validation)?;

        if self.store.username_taken(&username, None).await? {
            return Err(AuthError::UsernameTaken);
        }

        let user = self
            .store
            .add_user(UserChanges {
                username,
                password: Some(password.to_string()),
                is_admin: false,
                user_logo: None,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "Registered new account");
        Ok(user)
    }

    async fn current_user(&self, id: i32) -> Result<User, AuthError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
