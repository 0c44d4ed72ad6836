//! Repository layer: the `Store` abstraction and its backends
//!
//! The lifecycle core only talks to [`Store`]. [`Repository`] is the Postgres
//! backend, [`memory::MemoryStore`] keeps everything in process.

pub mod books;
pub mod checkouts;
pub mod memory;
pub mod orders;
pub mod reference;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        Author, Book, BookStatus, Category, Checkout, CreateAccount, CreateAuthor, CreateBook,
        Language, NewCheckout, Order, OrderStatus, ResourceKind, ResourceRef, UpdateBook,
        UpdateCheckout, UpdateProfile, User,
    },
};

/// Persisted store consumed by the lifecycle core.
///
/// Every `*_set_status` / conditional method only writes when the current
/// persisted state still matches `expected`, and reports whether it wrote.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by readiness checks
    async fn ping(&self) -> AppResult<()>;

    /// Owner projection of a resource; `None` when it does not exist
    async fn owner_of(&self, resource: ResourceRef) -> AppResult<Option<i32>>;

    /// Listed book; deleted books are not returned
    async fn book_get(&self, id: i32) -> AppResult<Option<Book>>;
    /// Fails with `ValidationFailure` when an author, language or category id is unknown
    async fn book_create(&self, owner_id: i32, book: &CreateBook) -> AppResult<Book>;
    async fn book_update(&self, id: i32, changes: &UpdateBook) -> AppResult<Option<Book>>;
    async fn book_set_status(&self, id: i32, expected: BookStatus, next: BookStatus) -> AppResult<bool>;
    /// Retires the book; its orders and checkouts are kept
    async fn book_delete(&self, id: i32, expected: BookStatus) -> AppResult<bool>;
    /// Available books, newest listing first
    async fn books_available(&self) -> AppResult<Vec<Book>>;

    async fn author_create(&self, author: &CreateAuthor) -> AppResult<Author>;
    async fn authors_list(&self) -> AppResult<Vec<Author>>;
    async fn languages_list(&self) -> AppResult<Vec<Language>>;
    async fn categories_list(&self) -> AppResult<Vec<Category>>;

    async fn order_get(&self, id: i32) -> AppResult<Option<Order>>;
    /// Pending order for the book, or fulfilled order whose checkout is not returned
    async fn order_find_open(&self, book_id: i32) -> AppResult<Option<Order>>;
    async fn order_create(&self, book_id: i32, user_id: i32) -> AppResult<Order>;
    async fn order_set_status(&self, id: i32, expected: OrderStatus, next: OrderStatus) -> AppResult<bool>;
    async fn orders_by_user(&self, user_id: i32) -> AppResult<Vec<Order>>;

    async fn checkout_get(&self, id: i32) -> AppResult<Option<Checkout>>;
    async fn checkout_get_by_order(&self, order_id: i32) -> AppResult<Option<Checkout>>;
    /// Fails with `ConcurrentModification` when the order already has a checkout
    async fn checkout_create(&self, checkout: &NewCheckout) -> AppResult<Checkout>;
    /// Applies only while the checkout has no return date
    async fn checkout_update(&self, id: i32, changes: &UpdateCheckout) -> AppResult<Option<Checkout>>;

    async fn user_get(&self, id: i32) -> AppResult<Option<User>>;
    async fn user_get_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn user_create(&self, account: &CreateAccount, password_hash: &str) -> AppResult<User>;
    async fn user_update_profile(&self, id: i32, profile: &UpdateProfile) -> AppResult<Option<User>>;
    async fn user_set_password(&self, id: i32, password_hash: &str) -> AppResult<bool>;
}

pub type DynStore = Arc<dyn Store>;

/// Postgres repository holding the connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub orders: orders::OrdersRepository,
    pub checkouts: checkouts::CheckoutsRepository,
    pub reference: reference::ReferenceRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            orders: orders::OrdersRepository::new(pool.clone()),
            checkouts: checkouts::CheckoutsRepository::new(pool.clone()),
            reference: reference::ReferenceRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Reject a book status write that has no lifecycle edge
pub(crate) fn check_book_edge(expected: BookStatus, next: BookStatus) -> AppResult<()> {
    if expected.can_become(next) {
        Ok(())
    } else {
        Err(AppError::Internal(format!("No book status edge {} -> {}", expected, next)))
    }
}

/// Orders only ever leave `pending`
pub(crate) fn check_order_edge(expected: OrderStatus, next: OrderStatus) -> AppResult<()> {
    if expected.is_terminal() || !next.is_terminal() {
        Err(AppError::Internal(format!("No order status edge {} -> {}", expected, next)))
    } else {
        Ok(())
    }
}

/// Map a unique-constraint violation to a domain error, pass others through
pub(crate) fn on_unique_violation(err: sqlx::Error, domain: impl FnOnce() -> AppError) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => domain(),
        _ => AppError::Database(err),
    }
}

/// Validation failure for an id that names no row
pub(crate) fn missing_reference(field: &str) -> AppError {
    AppError::validation(field, format!("{} does not reference an existing record", field))
}

/// Map a foreign-key violation on `table` to a validation failure on the referencing column
pub(crate) fn on_foreign_key_violation(err: sqlx::Error, table: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            let field = db
                .constraint()
                .and_then(|constraint| referencing_column(table, constraint))
                .unwrap_or("id");
            missing_reference(field)
        }
        _ => AppError::Database(err),
    }
}

/// Column of a default-named foreign key, e.g. `books_author_id_fkey` -> `author_id`
fn referencing_column<'a>(table: &str, constraint: &'a str) -> Option<&'a str> {
    constraint
        .strip_prefix(table)?
        .strip_prefix('_')?
        .strip_suffix("_fkey")
}

#[async_trait]
impl Store for Repository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn owner_of(&self, resource: ResourceRef) -> AppResult<Option<i32>> {
        match resource.kind {
            ResourceKind::Book => self.books.owner_of(resource.id).await,
            ResourceKind::Order => self.orders.owner_of(resource.id).await,
            ResourceKind::Checkout => self.checkouts.owner_of(resource.id).await,
        }
    }

    async fn book_get(&self, id: i32) -> AppResult<Option<Book>> {
        self.books.get_by_id(id).await
    }

    async fn book_create(&self, owner_id: i32, book: &CreateBook) -> AppResult<Book> {
        self.books.create(owner_id, book).await
    }

    async fn book_update(&self, id: i32, changes: &UpdateBook) -> AppResult<Option<Book>> {
        self.books.update(id, changes).await
    }

    async fn book_set_status(&self, id: i32, expected: BookStatus, next: BookStatus) -> AppResult<bool> {
        check_book_edge(expected, next)?;
        self.books.set_status(id, expected, next).await
    }

    async fn book_delete(&self, id: i32, expected: BookStatus) -> AppResult<bool> {
        self.books.delete(id, expected).await
    }

    async fn books_available(&self) -> AppResult<Vec<Book>> {
        self.books.available().await
    }

    async fn author_create(&self, author: &CreateAuthor) -> AppResult<Author> {
        self.reference.create_author(author).await
    }

    async fn authors_list(&self) -> AppResult<Vec<Author>> {
        self.reference.authors().await
    }

    async fn languages_list(&self) -> AppResult<Vec<Language>> {
        self.reference.languages().await
    }

    async fn categories_list(&self) -> AppResult<Vec<Category>> {
        self.reference.categories().await
    }

    async fn order_get(&self, id: i32) -> AppResult<Option<Order>> {
        self.orders.get_by_id(id).await
    }

    async fn order_find_open(&self, book_id: i32) -> AppResult<Option<Order>> {
        self.orders.find_open(book_id).await
    }

    async fn order_create(&self, book_id: i32, user_id: i32) -> AppResult<Order> {
        self.orders.create(book_id, user_id).await
    }

    async fn order_set_status(&self, id: i32, expected: OrderStatus, next: OrderStatus) -> AppResult<bool> {
        check_order_edge(expected, next)?;
        self.orders.set_status(id, expected, next).await
    }

    async fn orders_by_user(&self, user_id: i32) -> AppResult<Vec<Order>> {
        self.orders.by_user(user_id).await
    }

    async fn checkout_get(&self, id: i32) -> AppResult<Option<Checkout>> {
        self.checkouts.get_by_id(id).await
    }

    async fn checkout_get_by_order(&self, order_id: i32) -> AppResult<Option<Checkout>> {
        self.checkouts.get_by_order(order_id).await
    }

    async fn checkout_create(&self, checkout: &NewCheckout) -> AppResult<Checkout> {
        self.checkouts.create(checkout).await
    }

    async fn checkout_update(&self, id: i32, changes: &UpdateCheckout) -> AppResult<Option<Checkout>> {
        self.checkouts.update_unreturned(id, changes).await
    }

    async fn user_get(&self, id: i32) -> AppResult<Option<User>> {
        self.users.get_by_id(id).await
    }

    async fn user_get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.users.get_by_email(email).await
    }

    async fn user_create(&self, account: &CreateAccount, password_hash: &str) -> AppResult<User> {
        self.users.create(account, password_hash).await
    }

    async fn user_update_profile(&self, id: i32, profile: &UpdateProfile) -> AppResult<Option<User>> {
        self.users.update_profile(id, profile).await
    }

    async fn user_set_password(&self, id: i32, password_hash: &str) -> AppResult<bool> {
        self.users.set_password(id, password_hash).await
    }
}
