//! Catalog management service (categories and books)

use serde::Serialize;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult, FieldErrors},
    models::{
        book::{Book, BookFilter, BookPayload, BookQuery, NewBook},
        category::{Category, CategoryPayload, NewCategory},
        pagination::{PageRequest, Paginated},
    },
    repository::{
        books::{unknown_category, ISBN_TAKEN},
        categories::NAME_TAKEN,
        Repository,
    },
};

/// Book list response: a page, or the whole list when pagination is off
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BookListing {
    Page(Paginated<Book>),
    All(Vec<Book>),
}

/// PUT replaces the record, PATCH overlays the provided fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Full,
    Partial,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        Self { repository, config }
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.repository.categories_list().await
    }

    pub async fn get_category(&self, id: i32) -> AppResult<Category> {
        self.repository.categories_get(id).await
    }

    pub async fn create_category(&self, payload: CategoryPayload) -> AppResult<Category> {
        let data = self.validate_category(payload, None).await?;
        let category = self.repository.categories_create(&data).await?;
        tracing::info!("Created category id={} name={}", category.id, category.name);
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: i32,
        payload: CategoryPayload,
        mode: UpdateMode,
    ) -> AppResult<Category> {
        let existing = self.repository.categories_get(id).await?;
        let payload = match mode {
            UpdateMode::Full => payload,
            UpdateMode::Partial => payload.merged_onto(&existing),
        };
        let data = self.validate_category(payload, Some(id)).await?;
        self.repository.categories_update(id, &data).await
    }

    /// Delete a category together with its books
    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        self.repository.categories_delete(id).await?;
        tracing::info!("Deleted category id={} and its books", id);
        Ok(())
    }

    async fn validate_category(&self, payload: CategoryPayload, exclude_id: Option<i32>) -> AppResult<NewCategory> {
        let data = payload.decode().map_err(AppError::Validation)?;
        if self.repository.categories_name_taken(&data.name, exclude_id).await? {
            return Err(AppError::field("name", NAME_TAKEN));
        }
        Ok(data)
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    /// List books matching the query filters, paginated when enabled
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<BookListing> {
        let filter = BookFilter::from(query);

        if !self.config.paginate_books {
            let books = self.repository.books_list(&filter, None).await?;
            return Ok(BookListing::All(books));
        }

        let request = PageRequest::parse(
            query.page.as_deref(),
            query.page_size.as_deref(),
            self.config.page_size,
            self.config.max_page_size,
        );
        let count = self.repository.books_count(&filter).await?;

        let page = match request.offset() {
            Some(offset) if offset < count => {
                let books = self
                    .repository
                    .books_list(&filter, Some((request.page_size, offset)))
                    .await?;
                Paginated::new(books, count, &request)
            }
            Some(_) => Paginated::new(Vec::new(), count, &request),
            None => Paginated::empty(count),
        };

        Ok(BookListing::Page(page))
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books_get(id).await
    }

    pub async fn create_book(&self, payload: BookPayload) -> AppResult<Book> {
        let data = self.validate_book(payload, None).await?;
        let book = self.repository.books_create(&data).await?;
        tracing::info!("Created book id={} isbn={}", book.id, book.isbn);
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, payload: BookPayload, mode: UpdateMode) -> AppResult<Book> {
        let existing = self.repository.books_get(id).await?;
        let payload = match mode {
            UpdateMode::Full => payload,
            UpdateMode::Partial => payload.merged_onto(&existing),
        };
        let data = self.validate_book(payload, Some(id)).await?;
        self.repository.books_update(id, &data).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books_delete(id).await?;
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }

    /// Decode the payload, then check ISBN uniqueness and the category reference
    async fn validate_book(&self, payload: BookPayload, exclude_id: Option<i32>) -> AppResult<NewBook> {
        let data = payload.decode().map_err(AppError::Validation)?;

        let mut errors = FieldErrors::new();
        if self.repository.books_isbn_taken(&data.isbn, exclude_id).await? {
            errors.add("ISBN", ISBN_TAKEN);
        }
        if !self.repository.categories_exists(data.category_id).await? {
            errors.add("category", unknown_category(data.category_id));
        }
        errors.into_result()?;

        Ok(data)
    }
}
