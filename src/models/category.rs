//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::bounded_text;
use crate::error::FieldErrors;

pub const NAME_MAX_LEN: usize = 100;

/// Category record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    /// Unique category name
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Create / update category request
///
/// `None` is an absent field, `Some(None)` an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CategoryPayload {
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
}

/// Validated category, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
}

impl CategoryPayload {
    /// Fill the fields absent from a partial update with the stored values
    pub fn merged_onto(self, existing: &Category) -> Self {
        Self {
            name: self.name.or_else(|| Some(Some(existing.name.clone()))),
        }
    }

    pub fn decode(self) -> Result<NewCategory, FieldErrors> {
        let mut errors = FieldErrors::new();
        match bounded_text(&mut errors, "name", self.name, NAME_MAX_LEN) {
            Some(name) => Ok(NewCategory { name }),
            None => Err(errors),
        }
    }
}
