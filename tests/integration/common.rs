//! Shared fixtures

use std::sync::Arc;

use rust_decimal::Decimal;

use bookshare_server::{
    config::{AuthConfig, EventsConfig},
    models::{Book, Checkout, CreateBook, CreateCheckout, Order, Principal},
    repository::memory::MemoryStore,
    services::{
        lifecycle::{Transition, TransitionOutcome},
        Services,
    },
};

pub const LISTER: Principal = Principal { user_id: 1 };
pub const BORROWER: Principal = Principal { user_id: 2 };
pub const OTHER: Principal = Principal { user_id: 3 };

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-secret".to_string(),
        jwt_expiration_hours: 1,
    }
}

/// Services over a fresh memory store
pub fn harness() -> (Services, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let services = Services::new(store.clone(), &auth_config(), &EventsConfig::default());
    (services, store)
}

pub fn new_book(title: &str) -> CreateBook {
    CreateBook {
        title: title.to_string(),
        author_id: 1,
        language_id: 1,
        category_id: 1,
        condition: "good".to_string(),
        price: Decimal::new(1500, 2),
        isbn: None,
        description: None,
        published_date: None,
    }
}

pub async fn list(services: &Services, owner: &Principal, title: &str) -> Book {
    match services
        .lifecycle
        .apply(Some(owner), Transition::List(new_book(title)))
        .await
        .unwrap()
    {
        TransitionOutcome::Book(book) => book,
        other => panic!("expected a book, got {:?}", other),
    }
}

pub async fn order(services: &Services, orderer: &Principal, book_id: i32) -> Order {
    match services
        .lifecycle
        .apply(Some(orderer), Transition::Order { book_id })
        .await
        .unwrap()
    {
        TransitionOutcome::Order(order) => order,
        other => panic!("expected an order, got {:?}", other),
    }
}

pub async fn checkout(services: &Services, orderer: &Principal, order_id: i32) -> Checkout {
    match services
        .lifecycle
        .apply(
            Some(orderer),
            Transition::Checkout {
                order_id,
                request: CreateCheckout::default(),
            },
        )
        .await
        .unwrap()
    {
        TransitionOutcome::Checkout(checkout) => checkout,
        other => panic!("expected a checkout, got {:?}", other),
    }
}
