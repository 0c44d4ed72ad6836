//! Book, order and reference data reads; book metadata edits; new authors

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, Category, CreateAuthor, Language, Order, Principal, ResourceRef, UpdateBook},
    repository::DynStore,
};

use super::authorization::{Action, Authorizer};

#[derive(Clone)]
pub struct CatalogService {
    store: DynStore,
    authorizer: Authorizer,
}

impl CatalogService {
    pub fn new(store: DynStore, authorizer: Authorizer) -> Self {
        Self { store, authorizer }
    }

    /// Get book by ID
    pub async fn get_book(&self, principal: Option<&Principal>, id: i32) -> AppResult<Book> {
        self.authorizer
            .require(principal, Action::GetBook, Some(ResourceRef::book(id)))
            .await?;

        self.store
            .book_get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Edit descriptive fields of a listing; status only moves through transitions
    pub async fn update_book(&self, principal: Option<&Principal>, id: i32, changes: UpdateBook) -> AppResult<Book> {
        self.authorizer
            .require(principal, Action::UpdateBook, Some(ResourceRef::book(id)))
            .await?;

        changes.validate()?;
        if changes.is_empty() {
            return Err(AppError::Validation {
                message: "No book fields to update".to_string(),
                field: None,
            });
        }

        let book = self
            .store
            .book_update(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        tracing::info!("Updated book {}", book.id);
        Ok(book)
    }

    /// Books open to orders, newest listing first
    pub async fn available_books(&self, principal: Option<&Principal>) -> AppResult<Vec<Book>> {
        self.authorizer.require(principal, Action::GetAvailableBooks, None).await?;
        self.store.books_available().await
    }

    pub async fn add_author(&self, principal: Option<&Principal>, author: CreateAuthor) -> AppResult<Author> {
        self.authorizer.require(principal, Action::AddAuthor, None).await?;
        author.validate()?;
        if author.name.trim().is_empty() {
            return Err(AppError::validation("name", "Author name is required"));
        }

        let author = self.store.author_create(&author).await?;
        tracing::info!("Added author {} ({})", author.id, author.name);
        Ok(author)
    }

    pub async fn authors(&self, principal: Option<&Principal>) -> AppResult<Vec<Author>> {
        self.authorizer.require(principal, Action::GetAuthors, None).await?;
        self.store.authors_list().await
    }

    pub async fn languages(&self, principal: Option<&Principal>) -> AppResult<Vec<Language>> {
        self.authorizer.require(principal, Action::GetLanguages, None).await?;
        self.store.languages_list().await
    }

    pub async fn categories(&self, principal: Option<&Principal>) -> AppResult<Vec<Category>> {
        self.authorizer.require(principal, Action::GetCategories, None).await?;
        self.store.categories_list().await
    }

    /// Get order by ID
    pub async fn get_order(&self, principal: Option<&Principal>, id: i32) -> AppResult<Order> {
        self.authorizer
            .require(principal, Action::GetOrder, Some(ResourceRef::order(id)))
            .await?;

        self.store
            .order_get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order with id {} not found", id)))
    }

    /// Orders placed by the caller, newest first
    pub async fn user_orders(&self, principal: Option<&Principal>) -> AppResult<Vec<Order>> {
        self.authorizer.require(principal, Action::GetUserOrders, None).await?;
        let user_id = principal
            .map(|p| p.user_id)
            .ok_or_else(|| AppError::Unauthenticated("Missing credential".to_string()))?;

        self.store.orders_by_user(user_id).await
    }
}
