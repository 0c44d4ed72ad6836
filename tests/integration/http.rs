//! REST surface exercised in process through the router

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bookshare_server::{
    api,
    config::{AppConfig, DatabaseConfig, EventsConfig, LoggingConfig, ServerConfig},
    repository::memory::MemoryStore,
    services::Services,
    AppState,
};

use crate::common::auth_config;

fn app() -> Router {
    let config = AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "memory://".to_string(),
            ..DatabaseConfig::default()
        },
        auth: auth_config(),
        logging: LoggingConfig::default(),
        events: EventsConfig::default(),
    };
    let services = Services::new(Arc::new(MemoryStore::new()), &config.auth, &config.events);
    api::router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Like `send`, with the raw body and content type left to the caller
async fn send_raw(app: &Router, method: Method, uri: &str, token: &str, content_type: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "name": "Reader", "email": email, "password": "correct-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["user"].get("password").is_none());
    body["token"].as_str().unwrap().to_string()
}

fn book_body() -> Value {
    json!({
        "title": "The Word for World Is Forest",
        "author_id": 1,
        "language_id": 1,
        "category_id": 1,
        "condition": "fair",
        "price": "7.50"
    })
}

#[tokio::test]
async fn test_order_and_checkout_over_http() {
    let app = app();
    let lister = register(&app, "lister@example.org").await;
    let borrower = register(&app, "borrower@example.org").await;

    let (status, book) = send(&app, Method::POST, "/books", Some(&lister), Some(book_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["status"], "available");
    let book_id = book["id"].as_i64().unwrap();

    let (status, order) = send(&app, Method::POST, &format!("/books/{}/orders", book_id), Some(&borrower), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");
    let order_id = order["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::DELETE, &format!("/books/{}", book_id), Some(&lister), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_transition");

    let (status, checkout) = send(
        &app,
        Method::POST,
        &format!("/orders/{}/checkout", order_id),
        Some(&borrower),
        Some(json!({ "note": "pick up on Friday" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(checkout["order_id"].as_i64(), Some(order_id));

    let (status, orders) = send(&app, Method::GET, "/orders", Some(&borrower), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders[0]["status"], "fulfilled");
}

#[tokio::test]
async fn test_error_responses_carry_kind() {
    let app = app();
    let lister = register(&app, "owner@example.org").await;
    let other = register(&app, "other@example.org").await;

    let (status, body) = send(&app, Method::POST, "/books", None, Some(book_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthenticated");

    let (status, body) = send(&app, Method::GET, "/books/not-an-id", Some(&lister), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let mut invalid = book_body();
    invalid["title"] = json!("");
    let (status, body) = send(&app, Method::POST, "/books", Some(&lister), Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "title");

    let (_, book) = send(&app, Method::POST, "/books", Some(&lister), Some(book_body())).await;
    let (status, body) = send(&app, Method::DELETE, &format!("/books/{}", book["id"]), Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "denied");

    let (status, _) = send(&app, Method::GET, "/subscriptions/deletedBook", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_and_me() {
    let app = app();
    register(&app, "le.guin@example.org").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "le.guin@example.org", "password": "correct-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "le.guin@example.org");

    let (status, _) = send(&app, Method::GET, "/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_checkout_body_leaves_order_pending() {
    let app = app();
    let lister = register(&app, "seller@example.org").await;
    let borrower = register(&app, "buyer@example.org").await;

    let (_, book) = send(&app, Method::POST, "/books", Some(&lister), Some(book_body())).await;
    let (_, order) = send(&app, Method::POST, &format!("/books/{}/orders", book["id"]), Some(&borrower), None).await;
    let order_id = order["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/orders/{}/checkout", order_id),
        Some(&borrower),
        Some(json!({ "total_price": "not-a-number", "note": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["kind"], "validation_failure");

    let (status, body) = send_raw(
        &app,
        Method::POST,
        &format!("/orders/{}/checkout", order_id),
        &borrower,
        "application/json",
        "{\"note\": ",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_failure");

    let (status, order) = send(&app, Method::GET, &format!("/orders/{}", order_id), Some(&borrower), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "pending");
    let (_, book) = send(&app, Method::GET, &format!("/books/{}", book["id"]), Some(&lister), None).await;
    assert_eq!(book["status"], "reserved");

    // An omitted body still checks out at the list price
    let (status, checkout) = send(&app, Method::POST, &format!("/orders/{}/checkout", order_id), Some(&borrower), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(checkout["total_price"], "7.50");
}

#[tokio::test]
async fn test_mistyped_json_bodies_are_validation_failures() {
    let app = app();
    let lister = register(&app, "typist@example.org").await;

    let (status, body) = send(&app, Method::POST, "/books", Some(&lister), Some(json!({ "title": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_failure");
    assert_eq!(body["field"], "title");

    let (status, body) = send_raw(&app, Method::POST, "/books", &lister, "text/plain", "title=Dune").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_failure");

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "typist@example.org" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_failure");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/checkouts/1",
        Some(&lister),
        Some(json!({ "return_date": "yesterday" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_failure");
}

#[tokio::test]
async fn test_listing_needs_known_references() {
    let app = app();
    let lister = register(&app, "cataloguer@example.org").await;

    let (status, languages) = send(&app, Method::GET, "/languages", Some(&lister), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(languages[0]["name"], "English");
    let (_, categories) = send(&app, Method::GET, "/categories", Some(&lister), None).await;
    assert!(categories.as_array().is_some_and(|c| !c.is_empty()));

    let mut unknown = book_body();
    unknown["author_id"] = json!(999);
    let (status, body) = send(&app, Method::POST, "/books", Some(&lister), Some(unknown)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_failure");
    assert_eq!(body["field"], "author_id");

    let (status, author) = send(
        &app,
        Method::POST,
        "/authors",
        Some(&lister),
        Some(json!({ "name": "Ursula K. Le Guin" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, authors) = send(&app, Method::GET, "/authors", Some(&lister), None).await;
    assert_eq!(authors[0]["id"], author["id"]);

    let mut known = book_body();
    known["author_id"] = author["id"].clone();
    known["language_id"] = languages[1]["id"].clone();
    let (status, book) = send(&app, Method::POST, "/books", Some(&lister), Some(known)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["author_id"], author["id"]);

    let mut pricey = book_body();
    pricey["price"] = json!("100000000.00");
    let (status, body) = send(&app, Method::POST, "/books", Some(&lister), Some(pricey)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "price");
}

#[tokio::test]
async fn test_available_books_listing() {
    let app = app();
    let lister = register(&app, "shelf@example.org").await;
    let borrower = register(&app, "browser@example.org").await;

    let (_, first) = send(&app, Method::POST, "/books", Some(&lister), Some(book_body())).await;
    let (_, second) = send(&app, Method::POST, "/books", Some(&lister), Some(book_body())).await;
    send(&app, Method::POST, &format!("/books/{}/orders", first["id"]), Some(&borrower), None).await;

    let (status, books) = send(&app, Method::GET, "/books", Some(&borrower), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&Value> = books.as_array().unwrap().iter().map(|b| &b["id"]).collect();
    assert_eq!(ids, vec![&second["id"]]);

    let (status, _) = send(&app, Method::GET, "/books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_and_password_upkeep() {
    let app = app();
    let token = register(&app, "odonian@example.org").await;

    let (status, me) = send(
        &app,
        Method::PUT,
        "/auth/me",
        Some(&token),
        Some(json!({ "name": "Laia Odo", "email": "Laia@Example.org", "phone": "555-0142" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "laia@example.org");
    assert_eq!(me["phone"], "555-0142");
    assert!(me.get("password").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/password/check",
        Some(&token),
        Some(json!({ "password": "wrong-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "password");

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/password/check",
        Some(&token),
        Some(json!({ "password": "correct-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/auth/password",
        Some(&token),
        Some(json!({ "password": "battery-staple" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let login = |password: &str| json!({ "email": "laia@example.org", "password": password });
    let (status, _) = send(&app, Method::POST, "/auth/login", None, Some(login("correct-horse"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::POST, "/auth/login", None, Some(login("battery-staple"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/auth/password",
        None,
        Some(json!({ "password": "battery-staple" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
