//! Data models for Stacks

pub mod book;
pub mod category;
pub mod pagination;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookFilter, BookPayload, BookQuery, NewBook};
pub use category::{Category, CategoryPayload, NewCategory};
pub use pagination::{PageRequest, Paginated};
pub use user::{RegisterPayload, RegisteredUser, TokenClaims, TokenType, User, UserSummary};

use crate::error::FieldErrors;

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const BLANK: &str = "This field may not be blank.";
pub(crate) const NULL: &str = "This field may not be null.";

/// Value of a nullable wire field: absent is required, `null` is rejected.
pub(crate) fn present<T>(errors: &mut FieldErrors, field: &str, value: Option<Option<T>>) -> Option<T> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(None) => {
            errors.add(field, NULL);
            None
        }
        Some(Some(value)) => Some(value),
    }
}

/// Required text, trimmed, not blank and at most `max` characters
pub(crate) fn bounded_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<Option<String>>,
    max: usize,
) -> Option<String> {
    let value = present(errors, field, value);
    let text = text_field(errors, field, value)?;
    if text.chars().count() > max {
        errors.add(field, too_long(max));
        return None;
    }
    Some(text)
}

/// Trim a text field, reporting it as blank when nothing is left.
///
/// Missing values are left to the `required` check of the payload.
pub(crate) fn text_field(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    let value = value?.trim().to_string();
    if value.is_empty() {
        if !errors.has(field) {
            errors.add(field, BLANK);
        }
        return None;
    }
    Some(value)
}

/// Message used when a text field exceeds its column size
pub(crate) fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}
