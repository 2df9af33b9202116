//! Authentication service implementation.
//!
//! Exchanges credentials for JWT pairs, refreshes access tokens and
//! bootstraps the configured admin account.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{hash_password, identity_of, verify_password, TokenPair};
use crate::config::AdminBootstrap;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use billing_core::validation::{validate_email, validate_password, validate_user_name};
use billing_core::{Identity, User};
use billing_db::NewUser;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Self-service account creation.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

/// Tokens plus the account they were issued for.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// Authentication service implementation.
pub struct AuthService {
    state: Arc<AppState>,
}

impl AuthService {
    pub fn new(state: Arc<AppState>) -> Self {
        AuthService { state }
    }

    /// Checks credentials and issues a token pair.
    ///
    /// Unknown email, deleted account and wrong password all fail the same
    /// way.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        info!(email = %email.trim(), "Login request");

        let user = self.state.db.users().get_by_email(email).await?;
        let user = match user {
            Some(u) if verify_password(password, &u.password_hash) => u,
            _ => {
                warn!(email = %email.trim(), "Login rejected");
                return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
            }
        };

        let tokens = self.state.jwt.issue_pair(&identity_of(&user))?;
        info!(user_id = %user.user_id, "Token issued successfully");

        Ok(LoginResponse { tokens, user })
    }

    /// Creates a non-admin account and logs it in.
    pub async fn register(&self, request: RegisterRequest) -> ApiResult<LoginResponse> {
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
                    is_admin: false,
                },
                None,
            )
            .await?;

        info!(user_id = %user.user_id, "User registered");
        let tokens = self.state.jwt.issue_pair(&identity_of(&user))?;
        Ok(LoginResponse { tokens, user })
    }

    /// Issues a new access token for a still-active account.
    ///
    /// Admin rights are re-read from the store, not copied from the old
    /// token.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshResponse> {
        let claims = self.state.jwt.validate_refresh_token(refresh_token)?;

        let user = self
            .state
            .db
            .users()
            .get_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthenticated("User no longer exists".to_string()))?;

        let access_token = self.state.jwt.generate_access_token(&identity_of(&user))?;
        info!(user_id = %user.user_id, "Token refreshed successfully");

        Ok(RefreshResponse {
            access_token,
            expires_in: self.state.jwt.access_lifetime_secs(),
            token_type: "Bearer".to_string(),
        })
    }

    /// The stored account behind an identity.
    pub async fn current_user(&self, identity: &Identity) -> ApiResult<User> {
        self.state
            .db
            .users()
            .get_by_id(&identity.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    /// Creates the configured admin unless an account with that email exists.
    ///
    /// Returns the new account, or None when nothing was created.
    pub async fn bootstrap_admin(&self, admin: &AdminBootstrap) -> ApiResult<Option<User>> {
        if self.state.db.users().get_by_email(&admin.email).await?.is_some() {
            return Ok(None);
        }
        validate_email(&admin.email)?;
        validate_password(&admin.password)?;

        let user = self
            .state
            .db
            .users()
            .insert(
                &NewUser {
                    user_name: admin.name.trim().to_string(),
                    email: admin.email.clone(),
                    password_hash: hash_password(&admin.password)?,
                    is_admin: true,
                },
                None,
            )
            .await?;

        info!(user_id = %user.user_id, email = %user.email, "Bootstrap admin created");
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{account, test_state, TEST_PASSWORD};

    #[tokio::test]
    async fn test_login_and_identify() {
        let state = test_state().await;
        let admin = account(&state, "admin@example.com", true).await;
        let service = AuthService::new(state.clone());

        let response = service.login("Admin@Example.com", TEST_PASSWORD).await.unwrap();
        assert_eq!(response.user.user_id, admin.user_id);
        assert_eq!(response.tokens.token_type, "Bearer");

        let header = format!("Bearer {}", response.tokens.access_token);
        assert_eq!(state.jwt.identify(&header).unwrap(), admin);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let state = test_state().await;
        account(&state, "staff@example.com", false).await;
        let service = AuthService::new(state);

        let wrong = service.login("staff@example.com", "not-it").await.unwrap_err();
        let unknown = service.login("ghost@example.com", TEST_PASSWORD).await.unwrap_err();
        assert_eq!(wrong.status_code(), 401);
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_deleted_user_cannot_login_or_refresh() {
        let state = test_state().await;
        let staff = account(&state, "staff@example.com", false).await;
        let service = AuthService::new(state.clone());
        let pair = service.login("staff@example.com", TEST_PASSWORD).await.unwrap().tokens;

        state.db.users().soft_delete(&staff.user_id).await.unwrap();

        assert_eq!(
            service.login("staff@example.com", TEST_PASSWORD).await.unwrap_err().status_code(),
            401
        );
        assert_eq!(service.refresh(&pair.refresh_token).await.unwrap_err().status_code(), 401);
    }

    #[tokio::test]
    async fn test_register_then_refresh() {
        let state = test_state().await;
        let service = AuthService::new(state.clone());

        let registered = service
            .register(RegisterRequest {
                user_name: "New Staff".to_string(),
                email: "new@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();
        assert!(!registered.user.is_admin);

        let refreshed = service.refresh(&registered.tokens.refresh_token).await.unwrap();
        let claims = state.jwt.validate_access_token(&refreshed.access_token).unwrap();
        assert_eq!(claims.sub, registered.user.user_id);

        // an access token is not a refresh token
        assert!(service.refresh(&registered.tokens.access_token).await.is_err());

        let duplicate = service
            .register(RegisterRequest {
                user_name: "Other".to_string(),
                email: "new@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(duplicate.status_code(), 409);
        assert_eq!(duplicate.to_string(), "Conflict: email already exists");
    }

    #[tokio::test]
    async fn test_register_validates() {
        let service = AuthService::new(test_state().await);
        let err = service
            .register(RegisterRequest {
                user_name: "x".to_string(),
                email: "new@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_once() {
        let state = test_state().await;
        let service = AuthService::new(state.clone());
        let admin = AdminBootstrap {
            email: "root@example.com".to_string(),
            password: "changeme".to_string(),
            name: "Root".to_string(),
        };

        let created = service.bootstrap_admin(&admin).await.unwrap().unwrap();
        assert!(created.is_admin);
        assert!(service.bootstrap_admin(&admin).await.unwrap().is_none());

        let me = service.current_user(&identity_of(&created)).await.unwrap();
        assert_eq!(me.email, "root@example.com");
        assert!(service.login("root@example.com", "changeme").await.is_ok());
    }
}
