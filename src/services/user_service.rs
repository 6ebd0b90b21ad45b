//! Domain service for account administration and self-service profiles.

use serde::Deserialize;
use thiserror::Error;

use crate::models::User;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Cannot access another user's profile")]
    Forbidden,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Account fields as sent by the admin screen.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDraft {
    #[serde(default)]
    pub username: String,
    pub password: Option<String>,
    #[serde(default)]
    pub isadmin: bool,
    pub userlogo: Option<String>,
}

/// What a user may change about themselves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileDraft {
    #[serde(default)]
    pub username: String,
    pub userlogo: Option<String>,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Newest accounts first.
    async fn list(&self) -> Result<Vec<User>, UserError>;

    async fn create(&self, draft: UserDraft) -> Result<User, UserError>;

    /// Updates the account; the password is re-hashed only when provided.
    async fn update(&self, id: i32, draft: UserDraft) -> Result<User, UserError>;

    async fn delete(&self, id: i32) -> Result<(), UserError>;

    /// # Errors
    ///
    /// Returns [`UserError::Forbidden`] unless `viewer_id == id`.
    async fn get_profile(&self, viewer_id: i32, id: i32) -> Result<User, UserError>;

    async fn update_profile(
        &self,
        viewer_id: i32,
        id: i32,
        draft: ProfileDraft,
    ) -> Result<User, UserError>;
}
