//! # User Repository
//!
//! Staff and admin accounts. Passwords arrive already hashed; this layer
//! never sees plaintext.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use billing_core::{Page, PageRequest, User};

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Partial update; `None` leaves a column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_admin: Option<bool>,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn insert(&self, new: &NewUser, created_by: Option<&str>) -> DbResult<User> {
        let now = Utc::now();
        let user = User {
            user_id: Uuid::new_v4().to_string(),
            user_name: new.user_name.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            is_admin: new.is_admin,
            created_by: created_by.map(str::to_string),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        debug!(user_id = %user.user_id, email = %user.email, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id, user_name, email, password_hash, is_admin,
                created_by, created_at, updated_at, deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.user_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(&user.created_by)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &user.email),
            other => other,
        })?;

        Ok(user)
    }

    /// Gets an active user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, user_name, email, password_hash, is_admin,
                   created_by, created_at, updated_at, deleted_at
            FROM users
            WHERE user_id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets an active user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, user_name, email, password_hash, is_admin,
                   created_by, created_at, updated_at, deleted_at
            FROM users
            WHERE lower(email) = lower(?1) AND deleted_at IS NULL
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists active users, newest first.
    pub async fn list(&self, page: PageRequest) -> DbResult<Page<User>> {
        let total = self.count().await?;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, user_name, email, password_hash, is_admin,
                   created_by, created_at, updated_at, deleted_at
            FROM users
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC, user_id
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(page.per_page as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(users, page, total))
    }

    /// Applies a partial update and returns the stored row.
    pub async fn update(&self, id: &str, changes: &UserUpdate) -> DbResult<User> {
        debug!(user_id = %id, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                user_name = COALESCE(?2, user_name),
                email = COALESCE(?3, email),
                password_hash = COALESCE(?4, password_hash),
                is_admin = COALESCE(?5, is_admin),
                updated_at = ?6
            WHERE user_id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(&changes.user_name)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(changes.is_admin)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("email", changes.email.clone().unwrap_or_default())
            }
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Soft-deletes a user. Deleting twice is NotFound.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(user_id = %id, "Soft-deleting user");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users SET deleted_at = ?2, updated_at = ?2
            WHERE user_id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Counts active users.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            user_name: "Front Desk".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$stub".to_string(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = repo.insert(&new_user("desk@example.com"), None).await.unwrap();
        let found = repo.get_by_email("DESK@example.com").await.unwrap().unwrap();
        assert_eq!(found.user_id, user.user_id);
        assert_eq!(found.password_hash, "$argon2id$v=19$stub");
        assert!(repo.get_by_id(&user.user_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert(&new_user("a@example.com"), None).await.unwrap();
        let err = repo.insert(&new_user("a@example.com"), None).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_update_and_soft_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        let user = repo.insert(&new_user("b@example.com"), None).await.unwrap();

        let updated = repo
            .update(
                &user.user_id,
                &UserUpdate {
                    is_admin: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_admin);
        assert_eq!(updated.email, "b@example.com");

        repo.soft_delete(&user.user_id).await.unwrap();
        assert!(repo.get_by_id(&user.user_id).await.unwrap().is_none());
        assert!(matches!(
            repo.soft_delete(&user.user_id).await,
            Err(DbError::NotFound { .. })
        ));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        for i in 0..3 {
            repo.insert(&new_user(&format!("u{i}@example.com")), None).await.unwrap();
        }

        let page = repo.list(PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3);
        assert!(page.has_next);
    }
}
