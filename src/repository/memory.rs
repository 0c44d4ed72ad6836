//! In-process store backend
//!
//! Holds every table behind one mutex. The lock is never held across an
//! `.await`, so conditional writes are atomic with respect to each other.
//! Reference tables start with the same rows the migrations seed.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        reference::{ANONYMOUS_AUTHOR, SEEDED_CATEGORIES, SEEDED_LANGUAGES},
        Author, Book, BookStatus, Category, Checkout, CreateAccount, CreateAuthor, CreateBook,
        Language, NewCheckout, Order, OrderStatus, ResourceKind, ResourceRef, UpdateBook,
        UpdateCheckout, UpdateProfile, User,
    },
};

use super::{check_book_edge, check_order_edge, missing_reference, Store};

#[derive(Default)]
struct Tables {
    books: BTreeMap<i32, Book>,
    /// Deleted listings, kept so their orders still resolve
    retired_books: BTreeMap<i32, Book>,
    orders: BTreeMap<i32, Order>,
    checkouts: BTreeMap<i32, Checkout>,
    users: BTreeMap<i32, User>,
    authors: BTreeMap<i32, Author>,
    languages: BTreeMap<i32, Language>,
    categories: BTreeMap<i32, Category>,
    next_id: i32,
}

impl Tables {
    fn seeded() -> Self {
        let mut tables = Tables::default();
        tables.authors.insert(
            1,
            Author {
                id: 1,
                name: ANONYMOUS_AUTHOR.to_string(),
                created_at: Utc::now(),
            },
        );
        for (id, name) in (1..).zip(SEEDED_LANGUAGES) {
            tables.languages.insert(id, Language { id, name: name.to_string() });
        }
        for (id, name) in (1..).zip(SEEDED_CATEGORIES) {
            tables.categories.insert(id, Category { id, name: name.to_string() });
        }
        tables
    }

    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    /// Same checks the books foreign keys make
    fn check_references(
        &self,
        author_id: Option<i32>,
        language_id: Option<i32>,
        category_id: Option<i32>,
    ) -> AppResult<()> {
        if author_id.is_some_and(|id| !self.authors.contains_key(&id)) {
            return Err(missing_reference("author_id"));
        }
        if language_id.is_some_and(|id| !self.languages.contains_key(&id)) {
            return Err(missing_reference("language_id"));
        }
        if category_id.is_some_and(|id| !self.categories.contains_key(&id)) {
            return Err(missing_reference("category_id"));
        }
        Ok(())
    }

    fn is_open(&self, order: &Order) -> bool {
        match order.status {
            OrderStatus::Pending => true,
            OrderStatus::Fulfilled => self
                .checkouts
                .values()
                .any(|c| c.order_id == order.id && !c.is_returned()),
            OrderStatus::Cancelled => false,
        }
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::seeded())),
        }
    }

    fn tables(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    /// Whether a deleted listing is kept as history
    pub fn is_retired(&self, book_id: i32) -> AppResult<bool> {
        Ok(self.tables()?.retired_books.contains_key(&book_id))
    }

    /// Every order ever placed against a book
    pub fn orders_for_book(&self, book_id: i32) -> AppResult<Vec<Order>> {
        let tables = self.tables()?;
        Ok(tables.orders.values().filter(|o| o.book_id == book_id).cloned().collect())
    }

    /// Every checkout created for an order
    pub fn checkouts_for_order(&self, order_id: i32) -> AppResult<Vec<Checkout>> {
        let tables = self.tables()?;
        Ok(tables.checkouts.values().filter(|c| c.order_id == order_id).cloned().collect())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        self.tables().map(|_| ())
    }

    async fn owner_of(&self, resource: ResourceRef) -> AppResult<Option<i32>> {
        let tables = self.tables()?;
        let owner = match resource.kind {
            ResourceKind::Book => tables.books.get(&resource.id).map(|b| b.owner_id),
            ResourceKind::Order => tables.orders.get(&resource.id).map(|o| o.user_id),
            ResourceKind::Checkout => tables.checkouts.get(&resource.id).map(|c| c.user_id),
        };
        Ok(owner)
    }

    async fn book_get(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.tables()?.books.get(&id).cloned())
    }

    async fn book_create(&self, owner_id: i32, book: &CreateBook) -> AppResult<Book> {
        let mut tables = self.tables()?;
        tables.check_references(Some(book.author_id), Some(book.language_id), Some(book.category_id))?;
        let now = Utc::now();
        let id = tables.next_id();
        let book = Book {
            id,
            title: book.title.clone(),
            author_id: book.author_id,
            language_id: book.language_id,
            category_id: book.category_id,
            owner_id,
            status: BookStatus::Available,
            condition: book.condition.clone(),
            price: book.price,
            isbn: book.isbn.clone(),
            description: book.description.clone(),
            published_date: book.published_date.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.books.insert(id, book.clone());
        Ok(book)
    }

    async fn book_update(&self, id: i32, changes: &UpdateBook) -> AppResult<Option<Book>> {
        let mut tables = self.tables()?;
        if !tables.books.contains_key(&id) {
            return Ok(None);
        }
        tables.check_references(changes.author_id, changes.language_id, changes.category_id)?;
        let Some(book) = tables.books.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(ref title) = changes.title {
            book.title = title.clone();
        }
        if let Some(author_id) = changes.author_id {
            book.author_id = author_id;
        }
        if let Some(language_id) = changes.language_id {
            book.language_id = language_id;
        }
        if let Some(category_id) = changes.category_id {
            book.category_id = category_id;
        }
        if let Some(ref condition) = changes.condition {
            book.condition = condition.clone();
        }
        if let Some(price) = changes.price {
            book.price = price;
        }
        if changes.isbn.is_some() {
            book.isbn = changes.isbn.clone();
        }
        if changes.description.is_some() {
            book.description = changes.description.clone();
        }
        if changes.published_date.is_some() {
            book.published_date = changes.published_date.clone();
        }
        book.updated_at = Utc::now();

        Ok(Some(book.clone()))
    }

    async fn book_set_status(&self, id: i32, expected: BookStatus, next: BookStatus) -> AppResult<bool> {
        check_book_edge(expected, next)?;
        let mut tables = self.tables()?;
        match tables.books.get_mut(&id) {
            Some(book) if book.status == expected => {
                book.status = next;
                book.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn book_delete(&self, id: i32, expected: BookStatus) -> AppResult<bool> {
        let mut tables = self.tables()?;
        if !matches!(tables.books.get(&id), Some(book) if book.status == expected) {
            return Ok(false);
        }
        if let Some(mut book) = tables.books.remove(&id) {
            book.updated_at = Utc::now();
            tables.retired_books.insert(id, book);
        }
        Ok(true)
    }

    async fn books_available(&self) -> AppResult<Vec<Book>> {
        let tables = self.tables()?;
        let mut books: Vec<Book> = tables
            .books
            .values()
            .filter(|b| b.status == BookStatus::Available)
            .cloned()
            .collect();
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(books)
    }

    async fn author_create(&self, author: &CreateAuthor) -> AppResult<Author> {
        let mut tables = self.tables()?;
        let id = tables.authors.keys().next_back().map_or(1, |last| last + 1);
        let author = Author {
            id,
            name: author.name.trim().to_string(),
            created_at: Utc::now(),
        };
        tables.authors.insert(id, author.clone());
        Ok(author)
    }

    async fn authors_list(&self) -> AppResult<Vec<Author>> {
        let tables = self.tables()?;
        let mut authors: Vec<Author> = tables.authors.values().cloned().collect();
        authors.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(authors)
    }

    async fn languages_list(&self) -> AppResult<Vec<Language>> {
        Ok(self.tables()?.languages.values().cloned().collect())
    }

    async fn categories_list(&self) -> AppResult<Vec<Category>> {
        Ok(self.tables()?.categories.values().cloned().collect())
    }

    async fn order_get(&self, id: i32) -> AppResult<Option<Order>> {
        Ok(self.tables()?.orders.get(&id).cloned())
    }

    async fn order_find_open(&self, book_id: i32) -> AppResult<Option<Order>> {
        let tables = self.tables()?;
        let open = tables
            .orders
            .values()
            .filter(|o| o.book_id == book_id && tables.is_open(o))
            .max_by_key(|o| o.order_date)
            .cloned();
        Ok(open)
    }

    async fn order_create(&self, book_id: i32, user_id: i32) -> AppResult<Order> {
        let mut tables = self.tables()?;
        let pending_exists = tables
            .orders
            .values()
            .any(|o| o.book_id == book_id && o.status == OrderStatus::Pending);
        if pending_exists {
            return Err(AppError::ConcurrentModification(format!(
                "book {} already has a pending order",
                book_id
            )));
        }

        let id = tables.next_id();
        let order = Order {
            id,
            book_id,
            user_id,
            status: OrderStatus::Pending,
            order_date: Utc::now(),
        };
        tables.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn order_set_status(&self, id: i32, expected: OrderStatus, next: OrderStatus) -> AppResult<bool> {
        check_order_edge(expected, next)?;
        let mut tables = self.tables()?;
        match tables.orders.get_mut(&id) {
            Some(order) if order.status == expected => {
                order.status = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn orders_by_user(&self, user_id: i32) -> AppResult<Vec<Order>> {
        let tables = self.tables()?;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn checkout_get(&self, id: i32) -> AppResult<Option<Checkout>> {
        Ok(self.tables()?.checkouts.get(&id).cloned())
    }

    async fn checkout_get_by_order(&self, order_id: i32) -> AppResult<Option<Checkout>> {
        let tables = self.tables()?;
        Ok(tables.checkouts.values().find(|c| c.order_id == order_id).cloned())
    }

    async fn checkout_create(&self, checkout: &NewCheckout) -> AppResult<Checkout> {
        let mut tables = self.tables()?;
        if tables.checkouts.values().any(|c| c.order_id == checkout.order_id) {
            return Err(AppError::ConcurrentModification(format!(
                "order {} already has a checkout",
                checkout.order_id
            )));
        }

        let id = tables.next_id();
        let checkout = Checkout {
            id,
            order_id: checkout.order_id,
            user_id: checkout.user_id,
            total_price: checkout.total_price,
            checkout_date: checkout.checkout_date,
            return_date: None,
            note: checkout.note.clone(),
        };
        tables.checkouts.insert(id, checkout.clone());
        Ok(checkout)
    }

    async fn checkout_update(&self, id: i32, changes: &UpdateCheckout) -> AppResult<Option<Checkout>> {
        let mut tables = self.tables()?;
        match tables.checkouts.get_mut(&id) {
            Some(checkout) if !checkout.is_returned() => {
                if let Some(price) = changes.total_price {
                    checkout.total_price = price;
                }
                if changes.note.is_some() {
                    checkout.note = changes.note.clone();
                }
                if changes.return_date.is_some() {
                    checkout.return_date = changes.return_date;
                }
                Ok(Some(checkout.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn user_get(&self, id: i32) -> AppResult<Option<User>> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn user_get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn user_create(&self, account: &CreateAccount, password_hash: &str) -> AppResult<User> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|u| u.email.eq_ignore_ascii_case(&account.email)) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let id = tables.next_id();
        let user = User {
            id,
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            password: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn user_update_profile(&self, id: i32, profile: &UpdateProfile) -> AppResult<Option<User>> {
        let mut tables = self.tables()?;
        let taken = tables
            .users
            .values()
            .any(|u| u.id != id && u.email.eq_ignore_ascii_case(&profile.email));
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if taken {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        user.name = profile.name.clone();
        user.email = profile.email.clone();
        if profile.phone.is_some() {
            user.phone = profile.phone.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn user_set_password(&self, id: i32, password_hash: &str) -> AppResult<bool> {
        let mut tables = self.tables()?;
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.password = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
