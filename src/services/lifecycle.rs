//! Book / order / checkout lifecycle
//!
//! Every transition is authorized first, then validated against the state
//! read at its start, then written through a [`Cascade`]. One event is
//! published per successful cascade that has a topic.

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        Book, BookStatus, Checkout, CreateBook, CreateCheckout, NewCheckout, Order, OrderStatus,
        Principal, ResourceRef, UpdateCheckout,
    },
    repository::DynStore,
};

use super::{
    authorization::{Action, Authorizer},
    cascade::Cascade,
    events::{EventNotifier, EventPayload, Topic},
};

/// A requested lifecycle step and its arguments
#[derive(Debug, Clone)]
pub enum Transition {
    List(CreateBook),
    Order { book_id: i32 },
    CancelOrder { order_id: i32 },
    Checkout { order_id: i32, request: CreateCheckout },
    Return { checkout_id: i32 },
    UpdateCheckout { checkout_id: i32, changes: UpdateCheckout },
    DeleteBook { book_id: i32 },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::List(_) => "list",
            Transition::Order { .. } => "order",
            Transition::CancelOrder { .. } => "cancel_order",
            Transition::Checkout { .. } => "checkout",
            Transition::Return { .. } => "return",
            Transition::UpdateCheckout { .. } => "update_checkout",
            Transition::DeleteBook { .. } => "delete_book",
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Transition::List(_) => Action::AddBook,
            Transition::Order { .. } => Action::CreateOrder,
            Transition::CancelOrder { .. } => Action::CancelOrder,
            Transition::Checkout { .. } => Action::CreateCheckout,
            Transition::Return { .. } => Action::ReturnCheckout,
            Transition::UpdateCheckout { .. } => Action::UpdateCheckout,
            Transition::DeleteBook { .. } => Action::DeleteBook,
        }
    }

    /// Resource the authorization rule is evaluated against
    pub fn resource(&self) -> Option<ResourceRef> {
        match self {
            Transition::List(_) => None,
            Transition::Order { book_id } => Some(ResourceRef::book(*book_id)),
            Transition::CancelOrder { order_id } | Transition::Checkout { order_id, .. } => {
                Some(ResourceRef::order(*order_id))
            }
            Transition::Return { checkout_id } | Transition::UpdateCheckout { checkout_id, .. } => {
                Some(ResourceRef::checkout(*checkout_id))
            }
            Transition::DeleteBook { book_id } => Some(ResourceRef::book(*book_id)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    Book(Book),
    Order(Order),
    Checkout(Checkout),
    /// Snapshot of the book as it was before removal
    BookDeleted(Book),
}

#[derive(Clone)]
pub struct LifecycleService {
    store: DynStore,
    authorizer: Authorizer,
    events: EventNotifier,
}

impl LifecycleService {
    pub fn new(store: DynStore, authorizer: Authorizer, events: EventNotifier) -> Self {
        Self {
            store,
            authorizer,
            events,
        }
    }

    /// Authorize, validate and apply one transition
    pub async fn apply(&self, principal: Option<&Principal>, transition: Transition) -> AppResult<TransitionOutcome> {
        let name = transition.name();
        self.authorizer
            .require(principal, transition.action(), transition.resource())
            .await?;
        let principal = principal
            .copied()
            .ok_or_else(|| AppError::Unauthenticated(format!("{} requires authentication", name)))?;

        let result = match transition {
            Transition::List(book) => self.list(&principal, book).await,
            Transition::Order { book_id } => self.order(&principal, book_id).await,
            Transition::CancelOrder { order_id } => self.cancel_order(order_id).await,
            Transition::Checkout { order_id, request } => self.checkout(&principal, order_id, request).await,
            Transition::Return { checkout_id } => self.return_checkout(checkout_id).await,
            Transition::UpdateCheckout { checkout_id, changes } => self.update_checkout(checkout_id, changes).await,
            Transition::DeleteBook { book_id } => self.delete_book(book_id).await,
        };

        match &result {
            Ok(_) => tracing::info!("Transition {} applied for user {}", name, principal.user_id),
            Err(e) => tracing::info!("Transition {} rejected for user {}: {}", name, principal.user_id, e),
        }
        result
    }

    async fn list(&self, principal: &Principal, book: CreateBook) -> AppResult<TransitionOutcome> {
        book.validate()?;

        let mut cascade = Cascade::begin("list");
        let book = cascade
            .step("create_book", self.store.book_create(principal.user_id, &book))
            .await?;
        cascade.finish();

        Ok(TransitionOutcome::Book(book))
    }

    async fn order(&self, principal: &Principal, book_id: i32) -> AppResult<TransitionOutcome> {
        let book = self.load_book(book_id).await?;
        if book.status != BookStatus::Available {
            return Err(AppError::invalid_transition(
                "order",
                format!("book {} is {}", book.id, book.status),
            ));
        }
        if let Some(open) = self.store.order_find_open(book.id).await? {
            return Err(AppError::invalid_transition(
                "order",
                format!("book {} already has open order {}", book.id, open.id),
            ));
        }

        // Reserving first makes the status write the race arbiter
        let mut cascade = Cascade::begin("order");
        cascade
            .conditional(
                "reserve_book",
                format!("book {}", book.id),
                self.store.book_set_status(book.id, BookStatus::Available, BookStatus::Reserved),
            )
            .await?;
        let order = cascade
            .step("create_order", self.store.order_create(book.id, principal.user_id))
            .await?;
        cascade.finish();

        self.events.publish(Topic::LatestOrder, EventPayload::Order(order.clone()));
        Ok(TransitionOutcome::Order(order))
    }

    async fn cancel_order(&self, order_id: i32) -> AppResult<TransitionOutcome> {
        let order = self.load_order(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(AppError::invalid_transition(
                "cancel_order",
                format!("order {} is {}", order.id, order.status),
            ));
        }

        let mut cascade = Cascade::begin("cancel_order");
        cascade
            .conditional(
                "cancel_order",
                format!("order {}", order.id),
                self.store.order_set_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled),
            )
            .await?;
        cascade
            .conditional(
                "release_book",
                format!("book {}", order.book_id),
                self.store.book_set_status(order.book_id, BookStatus::Reserved, BookStatus::Available),
            )
            .await?;
        cascade.finish();

        let order = Order {
            status: OrderStatus::Cancelled,
            ..order
        };
        self.events.publish(Topic::UpdatedOrder, EventPayload::Order(order.clone()));
        Ok(TransitionOutcome::Order(order))
    }

    async fn checkout(
        &self,
        principal: &Principal,
        order_id: i32,
        request: CreateCheckout,
    ) -> AppResult<TransitionOutcome> {
        request.validate()?;

        let order = self.load_order(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(AppError::invalid_transition(
                "checkout",
                format!("order {} is {}", order.id, order.status),
            ));
        }
        if let Some(existing) = self.store.checkout_get_by_order(order.id).await? {
            return Err(AppError::invalid_transition(
                "checkout",
                format!("order {} already has checkout {}", order.id, existing.id),
            ));
        }
        let book = self.load_book(order.book_id).await?;
        if book.status != BookStatus::Reserved {
            return Err(AppError::invalid_transition(
                "checkout",
                format!("book {} is {}", book.id, book.status),
            ));
        }

        let new_checkout = NewCheckout {
            order_id: order.id,
            user_id: principal.user_id,
            total_price: request.total_price.unwrap_or(book.price),
            checkout_date: Utc::now(),
            note: request.note,
        };

        let mut cascade = Cascade::begin("checkout");
        let checkout = cascade
            .step("create_checkout", self.store.checkout_create(&new_checkout))
            .await?;
        cascade
            .conditional(
                "fulfil_order",
                format!("order {}", order.id),
                self.store.order_set_status(order.id, OrderStatus::Pending, OrderStatus::Fulfilled),
            )
            .await?;
        cascade
            .conditional(
                "check_out_book",
                format!("book {}", book.id),
                self.store.book_set_status(book.id, BookStatus::Reserved, BookStatus::CheckedOut),
            )
            .await?;
        cascade.finish();

        self.events.publish(Topic::LatestCheckout, EventPayload::Checkout(checkout.clone()));
        Ok(TransitionOutcome::Checkout(checkout))
    }

    async fn return_checkout(&self, checkout_id: i32) -> AppResult<TransitionOutcome> {
        let checkout = self.load_checkout(checkout_id).await?;
        if let Some(returned) = checkout.return_date {
            return Err(AppError::invalid_transition(
                "return",
                format!("checkout {} was returned on {}", checkout.id, returned),
            ));
        }
        let order = self.load_order(checkout.order_id).await?;

        let changes = UpdateCheckout {
            return_date: Some(Utc::now()),
            ..Default::default()
        };

        let mut cascade = Cascade::begin("return");
        let checkout = cascade
            .conditional_row(
                "record_return",
                format!("checkout {}", checkout.id),
                self.store.checkout_update(checkout.id, &changes),
            )
            .await?;
        cascade
            .conditional(
                "release_book",
                format!("book {}", order.book_id),
                self.store.book_set_status(order.book_id, BookStatus::CheckedOut, BookStatus::Available),
            )
            .await?;
        cascade.finish();

        self.events.publish(Topic::UpdatedCheckout, EventPayload::Checkout(checkout.clone()));
        Ok(TransitionOutcome::Checkout(checkout))
    }

    async fn update_checkout(&self, checkout_id: i32, changes: UpdateCheckout) -> AppResult<TransitionOutcome> {
        changes.validate()?;
        if changes.is_empty() {
            return Err(AppError::Validation {
                message: "No checkout fields to update".to_string(),
                field: None,
            });
        }

        let checkout = self.load_checkout(checkout_id).await?;
        if let Some(returned) = checkout.return_date {
            return Err(AppError::invalid_transition(
                "update_checkout",
                format!("checkout {} was returned on {}", checkout.id, returned),
            ));
        }
        let releases_book = match changes.return_date {
            Some(date) if date < checkout.checkout_date => {
                return Err(AppError::validation(
                    "return_date",
                    "Return date cannot precede the checkout date",
                ));
            }
            Some(_) => Some(self.load_order(checkout.order_id).await?),
            None => None,
        };

        let mut cascade = Cascade::begin("update_checkout");
        let checkout = cascade
            .conditional_row(
                "update_checkout",
                format!("checkout {}", checkout.id),
                self.store.checkout_update(checkout.id, &changes),
            )
            .await?;
        if let Some(order) = releases_book {
            cascade
                .conditional(
                    "release_book",
                    format!("book {}", order.book_id),
                    self.store.book_set_status(order.book_id, BookStatus::CheckedOut, BookStatus::Available),
                )
                .await?;
        }
        cascade.finish();

        self.events.publish(Topic::UpdatedCheckout, EventPayload::Checkout(checkout.clone()));
        Ok(TransitionOutcome::Checkout(checkout))
    }

    async fn delete_book(&self, book_id: i32) -> AppResult<TransitionOutcome> {
        let book = self.load_book(book_id).await?;
        if book.status != BookStatus::Available {
            return Err(AppError::invalid_transition(
                "delete_book",
                format!("book {} is {}", book.id, book.status),
            ));
        }
        if let Some(open) = self.store.order_find_open(book.id).await? {
            return Err(AppError::invalid_transition(
                "delete_book",
                format!("book {} has open order {}", book.id, open.id),
            ));
        }

        let mut cascade = Cascade::begin("delete_book");
        cascade
            .conditional(
                "delete_book",
                format!("book {}", book.id),
                self.store.book_delete(book.id, BookStatus::Available),
            )
            .await?;
        cascade.finish();

        Ok(TransitionOutcome::BookDeleted(book))
    }

    async fn load_book(&self, id: i32) -> AppResult<Book> {
        self.store
            .book_get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn load_order(&self, id: i32) -> AppResult<Order> {
        self.store
            .order_get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order with id {} not found", id)))
    }

    async fn load_checkout(&self, id: i32) -> AppResult<Checkout> {
        self.store
            .checkout_get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Checkout with id {} not found", id)))
    }
}
