//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{Store, UserChanges};
use crate::models::User;
use crate::services::input::trim_to_option;
use crate::services::user_service::{ProfileDraft, UserDraft, UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn required_username(username: &str) -> Result<String, UserError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(UserError::Validation("Username is required".to_string()));
        }
        Ok(username.to_string())
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn list(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.list_users().await?)
    }

    async fn create(&self, draft: UserDraft) -> Result<User, UserError> {
        let username = Self::required_username(&draft.username)?;
        let Some(password) = draft.password.filter(|p| !p.is_empty()) else {
            return Err(UserError::Validation(
                "Username and password are required".to_string(),
            ));
        };

        if self.store.username_taken(&username, None).await? {
            return Err(UserError::UsernameTaken);
        }

        let user = self
            .store
            .add_user(UserChanges {
                username,
                password: Some(password),
                is_admin: draft.isadmin,
                user_logo: trim_to_option(draft.userlogo.as_deref()),
            })
            .await?;

        info!(user_id = user.id, admin = user.isadmin, "Created user");
        Ok(user)
    }

    async fn update(&self, id: i32, draft: UserDraft) -> Result<User, UserError> {
        let username = Self::required_username(&draft.username)?;

        if self.store.username_taken(&username, Some(id)).await? {
            return Err(UserError::UsernameTaken);
        }

        self.store
            .update_user(
                id,
                UserChanges {
                    username,
                    password: draft.password.filter(|p| !p.is_empty()),
                    is_admin: draft.isadmin,
                    user_logo: trim_to_option(draft.userlogo.as_deref()),
                },
            )
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn delete(&self, id: i32) -> Result<(), UserError> {
        if self.store.remove_user(id).await? {
            info!(user_id = id, "Deleted user");
            Ok(())
        } else {
            Err(UserError::NotFound)
        }
    }

    async fn get_profile(&self, viewer_id: i32, id: i32) -> Result<User, UserError> {
        if viewer_id != id {
            return Err(UserError::Forbidden);
        }

        self.store.get_user(id).await?.ok_or(UserError::NotFound)
    }

    async fn update_profile(
        &self,
        viewer_id: i32,
        id: i32,
        draft: ProfileDraft,
    ) -> Result<User, UserError> {
        if viewer_id != id {
            return Err(UserError::Forbidden);
        }

        let username = Self::required_username(&draft.username)?;

        if self.store.username_taken(&username, Some(id)).await? {
            return Err(UserError::UsernameTaken);
        }

        self.store
            .update_user_profile(id, &username, trim_to_option(draft.userlogo.as_deref()))
            .await?
            .ok_or(UserError::NotFound)
    }
}
