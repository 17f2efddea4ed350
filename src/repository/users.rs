//! User account methods on Repository

use super::{unique_as_field, Repository};
use crate::{
    error::AppResult,
    models::user::{User, UserSummary},
};

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

impl Repository {
    /// Get user by username (authentication)
    pub async fn users_get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password, date_joined FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check if a username already exists
    pub async fn users_username_taken(&self, username: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// List id and username of every account
    pub async fn users_list(&self) -> AppResult<Vec<UserSummary>> {
        let rows = sqlx::query_as::<_, UserSummary>("SELECT id, username FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Create a user with an already hashed password
    pub async fn users_create(&self, username: &str, email: &str, password_hash: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password, date_joined
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_as_field(e, "username", USERNAME_TAKEN))
    }
}
