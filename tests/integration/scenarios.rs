//! End-to-end lifecycle scenarios over the memory store

use std::time::Duration;

use bookshare_server::{
    error::ErrorKind,
    models::{BookStatus, OrderStatus},
    repository::Store,
    services::{
        authorization::{Action, Decision},
        events::Topic,
        lifecycle::{Transition, TransitionOutcome},
    },
};
use tokio_stream::StreamExt;

use crate::common::{checkout, harness, list, order, BORROWER, LISTER, OTHER};

#[tokio::test]
async fn test_second_order_on_reserved_book_fails() {
    let (services, store) = harness();
    let book = list(&services, &LISTER, "Parable of the Sower").await;
    assert_eq!(book.status, BookStatus::Available);

    let first = order(&services, &BORROWER, book.id).await;
    assert_eq!(first.status, OrderStatus::Pending);
    assert_eq!(store.book_get(book.id).await.unwrap().unwrap().status, BookStatus::Reserved);

    let err = services
        .lifecycle
        .apply(Some(&OTHER), Transition::Order { book_id: book.id })
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::InvalidTransition | ErrorKind::ConcurrentModification
    ));
    assert_eq!(store.orders_for_book(book.id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_checkout_fulfils_order_and_checks_out_book() {
    let (services, store) = harness();
    let book = list(&services, &LISTER, "Dawn").await;
    let placed = order(&services, &BORROWER, book.id).await;

    let created = checkout(&services, &BORROWER, placed.id).await;
    assert_eq!(created.order_id, placed.id);
    assert!(created.return_date.is_none());

    let placed = store.order_get(placed.id).await.unwrap().unwrap();
    assert_eq!(placed.status, OrderStatus::Fulfilled);
    assert_eq!(store.book_get(book.id).await.unwrap().unwrap().status, BookStatus::CheckedOut);
    assert_eq!(store.checkouts_for_order(placed.id).unwrap().len(), 1);

    // A second checkout of the same order is rejected
    let err = services
        .lifecycle
        .apply(
            Some(&BORROWER),
            Transition::Checkout {
                order_id: placed.id,
                request: Default::default(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert_eq!(store.checkouts_for_order(placed.id).unwrap().len(), 1);
}

#[tokio::test]
async fn test_returned_book_can_be_ordered_again() {
    let (services, store) = harness();
    let book = list(&services, &LISTER, "Wild Seed").await;
    let placed = order(&services, &BORROWER, book.id).await;
    let created = checkout(&services, &BORROWER, placed.id).await;

    let returned = match services
        .lifecycle
        .apply(Some(&BORROWER), Transition::Return { checkout_id: created.id })
        .await
        .unwrap()
    {
        TransitionOutcome::Checkout(checkout) => checkout,
        other => panic!("expected a checkout, got {:?}", other),
    };
    assert!(returned.return_date.is_some());
    assert_eq!(store.book_get(book.id).await.unwrap().unwrap().status, BookStatus::Available);

    let again = order(&services, &OTHER, book.id).await;
    assert_eq!(again.status, OrderStatus::Pending);

    // Returning twice is not a transition
    let err = services
        .lifecycle
        .apply(Some(&BORROWER), Transition::Return { checkout_id: created.id })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

#[tokio::test]
async fn test_delete_book_rules() {
    let (services, store) = harness();
    let book = list(&services, &LISTER, "Imago").await;
    let placed = order(&services, &BORROWER, book.id).await;

    let reserved = services
        .lifecycle
        .apply(Some(&LISTER), Transition::DeleteBook { book_id: book.id })
        .await
        .unwrap_err();
    assert_eq!(reserved.kind(), ErrorKind::InvalidTransition);

    services
        .lifecycle
        .apply(Some(&BORROWER), Transition::CancelOrder { order_id: placed.id })
        .await
        .unwrap();
    assert_eq!(store.book_get(book.id).await.unwrap().unwrap().status, BookStatus::Available);

    let foreign = services
        .lifecycle
        .apply(Some(&OTHER), Transition::DeleteBook { book_id: book.id })
        .await
        .unwrap_err();
    assert_eq!(foreign.kind(), ErrorKind::Denied);

    let outcome = services
        .lifecycle
        .apply(Some(&LISTER), Transition::DeleteBook { book_id: book.id })
        .await
        .unwrap();
    assert!(matches!(outcome, TransitionOutcome::BookDeleted(ref b) if b.id == book.id));
    assert!(store.book_get(book.id).await.unwrap().is_none());

    // The cancelled order survives the deletion as history
    assert!(store.is_retired(book.id).unwrap());
    let history = store.orders_for_book(book.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OrderStatus::Cancelled);
    assert_eq!(store.order_get(placed.id).await.unwrap().map(|o| o.id), Some(placed.id));

    let err = services
        .lifecycle
        .apply(Some(&BORROWER), Transition::Order { book_id: book.id })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_deleting_a_returned_book_keeps_its_checkout() {
    let (services, store) = harness();
    let book = list(&services, &LISTER, "Mind of My Mind").await;
    let placed = order(&services, &BORROWER, book.id).await;
    let created = checkout(&services, &BORROWER, placed.id).await;
    services
        .lifecycle
        .apply(Some(&BORROWER), Transition::Return { checkout_id: created.id })
        .await
        .unwrap();

    services
        .lifecycle
        .apply(Some(&LISTER), Transition::DeleteBook { book_id: book.id })
        .await
        .unwrap();

    let kept = store.checkout_get(created.id).await.unwrap().unwrap();
    assert!(kept.return_date.is_some());
    assert_eq!(store.checkouts_for_order(placed.id).unwrap().len(), 1);
    assert_eq!(
        store.order_get(placed.id).await.unwrap().unwrap().status,
        OrderStatus::Fulfilled
    );
}

#[tokio::test]
async fn test_cancel_requires_a_pending_order() {
    let (services, store) = harness();

    let fulfilled_book = list(&services, &LISTER, "Survivor").await;
    let fulfilled = order(&services, &BORROWER, fulfilled_book.id).await;
    checkout(&services, &BORROWER, fulfilled.id).await;

    let err = services
        .lifecycle
        .apply(Some(&BORROWER), Transition::CancelOrder { order_id: fulfilled.id })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert_eq!(store.order_get(fulfilled.id).await.unwrap().unwrap().status, OrderStatus::Fulfilled);
    assert_eq!(
        store.book_get(fulfilled_book.id).await.unwrap().unwrap().status,
        BookStatus::CheckedOut
    );

    let cancelled_book = list(&services, &LISTER, "Clay's Ark").await;
    let cancelled = order(&services, &BORROWER, cancelled_book.id).await;
    services
        .lifecycle
        .apply(Some(&BORROWER), Transition::CancelOrder { order_id: cancelled.id })
        .await
        .unwrap();

    let err = services
        .lifecycle
        .apply(Some(&BORROWER), Transition::CancelOrder { order_id: cancelled.id })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert_eq!(
        store.book_get(cancelled_book.id).await.unwrap().unwrap().status,
        BookStatus::Available
    );
}

#[tokio::test]
async fn test_cancel_publishes_one_updated_order_event() {
    let (services, _) = harness();
    let updates = services.events.subscribe(Topic::UpdatedOrder, |_| true);
    tokio::pin!(updates);

    let book = list(&services, &LISTER, "Patternmaster").await;
    let placed = order(&services, &BORROWER, book.id).await;
    services
        .lifecycle
        .apply(Some(&BORROWER), Transition::CancelOrder { order_id: placed.id })
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), updates.next()).await.unwrap().unwrap();
    assert_eq!(event.payload.id(), placed.id);
    assert_eq!(event.topic, Topic::UpdatedOrder);
    match event.payload {
        bookshare_server::services::events::EventPayload::Order(ref cancelled) => {
            assert_eq!(cancelled.status, OrderStatus::Cancelled)
        }
        ref other => panic!("expected an order payload, got {:?}", other),
    }

    // A refused second cancel publishes nothing
    services
        .lifecycle
        .apply(Some(&BORROWER), Transition::CancelOrder { order_id: placed.id })
        .await
        .unwrap_err();
    assert!(tokio::time::timeout(Duration::from_millis(50), updates.next()).await.is_err());
}

#[tokio::test]
async fn test_cancelled_book_can_be_ordered_again() {
    let (services, store) = harness();
    let book = list(&services, &LISTER, "Bloodchild").await;
    let first = order(&services, &BORROWER, book.id).await;
    services
        .lifecycle
        .apply(Some(&BORROWER), Transition::CancelOrder { order_id: first.id })
        .await
        .unwrap();

    let again = order(&services, &OTHER, book.id).await;
    assert_eq!(again.status, OrderStatus::Pending);
    assert_ne!(again.id, first.id);
    assert_eq!(store.book_get(book.id).await.unwrap().unwrap().status, BookStatus::Reserved);
    assert_eq!(store.orders_for_book(book.id).unwrap().len(), 2);
}

#[tokio::test]
async fn test_anonymous_list_is_unauthenticated() {
    let (services, store) = harness();

    let err = services
        .authorizer
        .authorize(None, Action::AddBook, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);

    let err = services
        .lifecycle
        .apply(None, Transition::List(crate::common::new_book("Lilith's Brood")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    assert!(store.book_get(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_only_orderer_may_cancel_or_check_out() {
    let (services, _) = harness();
    let book = list(&services, &LISTER, "Fledgling").await;
    let placed = order(&services, &BORROWER, book.id).await;

    for transition in [
        Transition::CancelOrder { order_id: placed.id },
        Transition::Checkout {
            order_id: placed.id,
            request: Default::default(),
        },
    ] {
        let err = services.lifecycle.apply(Some(&LISTER), transition).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Denied);
    }

    // Absent orders are denied exactly like foreign ones
    let absent = services
        .authorizer
        .authorize(Some(&LISTER), Action::CancelOrder, Some(bookshare_server::models::ResourceRef::order(9999)))
        .await
        .unwrap();
    let foreign = services
        .authorizer
        .authorize(Some(&LISTER), Action::CancelOrder, Some(bookshare_server::models::ResourceRef::order(placed.id)))
        .await
        .unwrap();
    assert_eq!(absent, foreign);
    assert!(matches!(absent, Decision::Deny(_)));
}

#[tokio::test]
async fn test_lifecycle_publishes_one_event_per_transition() {
    let (services, _) = harness();
    let orders = services.events.subscribe(Topic::LatestOrder, |_| true);
    let updates = services.events.subscribe(Topic::UpdatedCheckout, |_| true);
    tokio::pin!(orders);
    tokio::pin!(updates);

    let book = list(&services, &LISTER, "Kindred").await;
    let placed = order(&services, &BORROWER, book.id).await;
    let created = checkout(&services, &BORROWER, placed.id).await;
    services
        .lifecycle
        .apply(Some(&BORROWER), Transition::Return { checkout_id: created.id })
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), orders.next()).await.unwrap().unwrap();
    assert_eq!(event.payload.id(), placed.id);
    let event = tokio::time::timeout(Duration::from_secs(1), updates.next()).await.unwrap().unwrap();
    assert_eq!(event.payload.id(), created.id);

    assert!(tokio::time::timeout(Duration::from_millis(50), orders.next()).await.is_err());
    assert!(tokio::time::timeout(Duration::from_millis(50), updates.next()).await.is_err());
}
