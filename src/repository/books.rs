//! Book domain methods on Repository

use sqlx::{Postgres, QueryBuilder};

use super::{violation, Repository, Violation};
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookFilter, NewBook},
};

pub const ISBN_TAKEN: &str = "book with this ISBN already exists.";

const BOOK_COLUMNS: &str = "id, title, author, published_date, isbn, category_id, added_at";

/// Message for a book pointing at a category that does not exist
pub fn unknown_category(id: i32) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards taken literally
pub fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Append the WHERE clause of a book filter
pub fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    qb.push(" WHERE TRUE");
    if filter.unsatisfiable {
        qb.push(" AND FALSE");
    }
    if let Some(ref author) = filter.author {
        qb.push(" AND author ILIKE ").push_bind(like_pattern(author));
    }
    if let Some(ref title) = filter.title {
        qb.push(" AND title ILIKE ").push_bind(like_pattern(title));
    }
    if let Some(category) = filter.category {
        qb.push(" AND category_id = ").push_bind(category);
    }
    if let Some(year) = filter.published_year {
        qb.push(" AND EXTRACT(YEAR FROM published_date)::int = ").push_bind(year);
    }
}

/// Map insert/update constraint failures to field errors
fn write_error(err: sqlx::Error, data: &NewBook) -> AppError {
    match violation(&err) {
        Some(Violation::Unique) => AppError::field("ISBN", ISBN_TAKEN),
        Some(Violation::ForeignKey) => AppError::field("category", unknown_category(data.category_id)),
        None => AppError::Database(err),
    }
}

impl Repository {
    /// List books matching a filter, optionally one page of them (limit, offset)
    pub async fn books_list(&self, filter: &BookFilter, page: Option<(i64, i64)>) -> AppResult<Vec<Book>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM books", BOOK_COLUMNS));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id");
        if let Some((limit, offset)) = page {
            qb.push(" LIMIT ").push_bind(limit);
            qb.push(" OFFSET ").push_bind(offset);
        }

        let rows = qb.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Count books matching a filter
    pub async fn books_count(&self, filter: &BookFilter) -> AppResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books");
        push_filter(&mut qb, filter);

        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Get book by ID
    pub async fn books_get(&self, id: i32) -> AppResult<Book> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Check if an ISBN is used by another book
    pub async fn books_isbn_taken(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND id != $2)")
                .bind(isbn)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                .bind(isbn)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// Create book
    pub async fn books_create(&self, data: &NewBook) -> AppResult<Book> {
        let query = format!(
            r#"
            INSERT INTO books (title, author, published_date, isbn, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(&data.title)
            .bind(&data.author)
            .bind(data.published_date)
            .bind(&data.isbn)
            .bind(data.category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, data))
    }

    /// Replace every writable field of a book; `added_at` is never touched
    pub async fn books_update(&self, id: i32, data: &NewBook) -> AppResult<Book> {
        let query = format!(
            r#"
            UPDATE books
            SET title = $1, author = $2, published_date = $3, isbn = $4, category_id = $5
            WHERE id = $6
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(&data.title)
            .bind(&data.author)
            .bind(data.published_date)
            .bind(&data.isbn)
            .bind(data.category_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, data))?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Delete book
    pub async fn books_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}
