//! User management. Every operation requires an admin caller.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::auth::{hash_password, require_admin};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use billing_core::validation::{validate_email, validate_password, validate_user_name};
use billing_core::{Identity, Page, PageRequest, User};
use billing_db::{NewUser, UserUpdate};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Fields left as `None` are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

pub struct UserService {
    state: Arc<AppState>,
}

impl UserService {
    pub fn new(state: Arc<AppState>) -> Self {
        UserService { state }
    }

    pub async fn create(&self, caller: &Identity, request: CreateUserRequest) -> ApiResult<User> {
        require_admin(caller)?;
        validate_user_name(&request.user_name)?;
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        let user = self
            .state
            .db
            .users()
            .insert(
                &NewUser {
                    user_name: request.user_name.trim().to_string(),
                    email: request.email.trim().to_string(),
                    password_hash: hash_password(&request.password)?,
                    is_admin: request.is_admin,
                },
                Some(&caller.user_id),
            )
            .await?;

        info!(user_id = %user.user_id, created_by = %caller.user_id, "User created");
        Ok(user)
    }

    pub async fn list(&self, caller: &Identity, page: PageRequest) -> ApiResult<Page<User>> {
        require_admin(caller)?;
        page.validate()?;
        Ok(self.state.db.users().list(page).await?)
    }

    pub async fn get(&self, caller: &Identity, user_id: &str) -> ApiResult<User> {
        require_admin(caller)?;
        self.state
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn update(&self, caller: &Identity, user_id: &str, request: UpdateUserRequest) -> ApiResult<User> {
        require_admin(caller)?;

        if let Some(name) = &request.user_name {
            validate_user_name(name)?;
        }
        if let Some(email) = &request.email {
            validate_email(email)?;
        }
        let password_hash = match &request.password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let user = self
            .state
            .db
            .users()
            .update(
                user_id,
                &UserUpdate {
                    user_name: request.user_name.map(|n| n.trim().to_string()),
                    email: request.email.map(|e| e.trim().to_string()),
                    password_hash,
                    is_admin: request.is_admin,
                },
            )
            .await?;

        info!(user_id = %user_id, updated_by = %caller.user_id, "User updated");
        Ok(user)
    }

    /// Soft-deletes an account. Admins cannot delete themselves.
    pub async fn delete(&self, caller: &Identity, user_id: &str) -> ApiResult<()> {
        require_admin(caller)?;
        if caller.user_id == user_id {
            return Err(ApiError::Validation("You cannot delete your own account".to_string()));
        }

        self.state.db.users().soft_delete(user_id).await?;
        info!(user_id = %user_id, deleted_by = %caller.user_id, "User deleted");
        Ok(())
    }
}
