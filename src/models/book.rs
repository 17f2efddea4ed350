//! Book model, request payloads and list filters

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use super::{bounded_text, present};
use crate::error::FieldErrors;

pub const TEXT_MAX_LEN: usize = 255;
pub const ISBN_MAX_LEN: usize = 13;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Book record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub published_date: NaiveDate,
    #[serde(rename = "ISBN")]
    #[sqlx(rename = "isbn")]
    pub isbn: String,
    /// Category ID
    #[sqlx(rename = "category_id")]
    pub category: i32,
    pub added_at: DateTime<Utc>,
}

/// Create / update book request
///
/// Fields are kept loose so that every problem is reported per field
/// instead of failing the whole body. `None` is an absent field,
/// `Some(None)` an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookPayload {
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub title: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub author: Option<Option<String>>,
    /// Date formatted as YYYY-MM-DD
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, example = "1954-07-29")]
    pub published_date: Option<Option<String>>,
    #[serde(rename = "ISBN", default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub isbn: Option<Option<String>>,
    /// Category ID (number or numeric string)
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub category: Option<Option<serde_json::Value>>,
}

/// Validated book, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub published_date: NaiveDate,
    pub isbn: String,
    pub category_id: i32,
}

impl BookPayload {
    /// Fill the fields absent from a partial update with the stored values
    pub fn merged_onto(self, existing: &Book) -> Self {
        Self {
            title: self.title.or_else(|| Some(Some(existing.title.clone()))),
            author: self.author.or_else(|| Some(Some(existing.author.clone()))),
            published_date: self
                .published_date
                .or_else(|| Some(Some(existing.published_date.format(DATE_FORMAT).to_string()))),
            isbn: self.isbn.or_else(|| Some(Some(existing.isbn.clone()))),
            category: self
                .category
                .or_else(|| Some(Some(serde_json::Value::from(existing.category)))),
        }
    }

    /// Check every field and build the record to write.
    ///
    /// Store-dependent checks (ISBN uniqueness, category existence) are done
    /// by the catalog service.
    pub fn decode(self) -> Result<NewBook, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = bounded_text(&mut errors, "title", self.title, TEXT_MAX_LEN);
        let author = bounded_text(&mut errors, "author", self.author, TEXT_MAX_LEN);
        let published_date = decode_date(&mut errors, self.published_date);
        let isbn = bounded_text(&mut errors, "ISBN", self.isbn, ISBN_MAX_LEN);
        let category_id = decode_category(&mut errors, self.category);

        match (title, author, published_date, isbn, category_id) {
            (Some(title), Some(author), Some(published_date), Some(isbn), Some(category_id))
                if errors.is_empty() =>
            {
                Ok(NewBook {
                    title,
                    author,
                    published_date,
                    isbn,
                    category_id,
                })
            }
            _ => Err(errors),
        }
    }
}

fn decode_date(errors: &mut FieldErrors, value: Option<Option<String>>) -> Option<NaiveDate> {
    let value = present(errors, "published_date", value)?;
    match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(
                "published_date",
                "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
            );
            None
        }
    }
}

fn decode_category(errors: &mut FieldErrors, value: Option<Option<serde_json::Value>>) -> Option<i32> {
    let id = match present(errors, "category", value)? {
        serde_json::Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };
    if id.is_none() {
        errors.add("category", "Incorrect type. Expected pk value.");
    }
    id
}

/// Raw query string of `GET /api/books/`
///
/// Values are kept as strings: a value that does not parse yields an empty
/// result rather than a rejected request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct BookQuery {
    /// Case-insensitive substring of the author
    pub author: Option<String>,
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Exact category ID
    pub category: Option<String>,
    /// Exact year of the publication date
    pub published_year: Option<String>,
    /// Page number, starting at 1
    pub page: Option<String>,
    /// Page size, capped by the server
    pub page_size: Option<String>,
}

/// Parsed book list filters, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub author: Option<String>,
    pub title: Option<String>,
    pub category: Option<i32>,
    pub published_year: Option<i32>,
    /// Set when a filter value could not be parsed; nothing can match
    pub unsatisfiable: bool,
}

impl From<&BookQuery> for BookFilter {
    fn from(query: &BookQuery) -> Self {
        let mut filter = BookFilter {
            author: non_empty(&query.author),
            title: non_empty(&query.title),
            ..Default::default()
        };

        if let Some(category) = non_empty(&query.category) {
            match category.parse() {
                Ok(id) => filter.category = Some(id),
                Err(_) => filter.unsatisfiable = true,
            }
        }
        if let Some(year) = non_empty(&query.published_year) {
            match year.parse() {
                Ok(year) => filter.published_year = Some(year),
                Err(_) => filter.unsatisfiable = true,
            }
        }

        filter
    }
}

/// Empty filter values are ignored
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
