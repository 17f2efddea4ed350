//! Repository layer for database operations

pub mod books;
pub mod categories;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::error::{AppError, AppResult};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Round-trip to the database (readiness probe)
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Constraint that rejected a write, if the error is a constraint violation
pub(crate) enum Violation {
    Unique,
    ForeignKey,
}

pub(crate) fn violation(err: &sqlx::Error) -> Option<Violation> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Some(Violation::Unique),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => Some(Violation::ForeignKey),
        _ => None,
    }
}

/// Map a lost uniqueness race to the field error the pre-check reports
pub(crate) fn unique_as_field(err: sqlx::Error, field: &str, message: &str) -> AppError {
    match violation(&err) {
        Some(Violation::Unique) => AppError::field(field, message),
        _ => AppError::Database(err),
    }
}
