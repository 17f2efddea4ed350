//! Category domain methods on Repository

use super::{unique_as_field, Repository};
use crate::{
    error::{AppError, AppResult},
    models::category::{Category, NewCategory},
};

pub const NAME_TAKEN: &str = "category with this name already exists.";

impl Repository {
    /// List all categories
    pub async fn categories_list(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get category by ID
    pub async fn categories_get(&self, id: i32) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name, created_at FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn categories_exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Check if a category name is used by another category
    pub async fn categories_name_taken(&self, name: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1 AND id != $2)")
                .bind(name)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// Create category
    pub async fn categories_create(&self, data: &NewCategory) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_as_field(e, "name", NAME_TAKEN))
    }

    /// Update category; `created_at` is never touched
    pub async fn categories_update(&self, id: i32, data: &NewCategory) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $1 WHERE id = $2 RETURNING id, name, created_at",
        )
        .bind(&data.name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_as_field(e, "name", NAME_TAKEN))?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Delete category; its books go with it (ON DELETE CASCADE)
    pub async fn categories_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }
}
