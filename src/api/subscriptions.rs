//! Lifecycle event subscriptions over Server-Sent Events

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Deserialize;
use tokio_stream::{Stream, StreamExt};
use utoipa::IntoParams;

use crate::{error::AppResult, services::events::Topic, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SubscriptionQuery {
    /// Only forward events about this order or checkout
    pub id: Option<i32>,
}

/// Stream lifecycle events of one topic
///
/// Topics are `latestOrder`, `updatedOrder`, `latestCheckout` and
/// `updatedCheckout`. Each SSE message carries the topic as its event name
/// and the order or checkout as JSON data.
#[utoipa::path(
    get,
    path = "/subscriptions/{topic}",
    tag = "subscriptions",
    params(
        ("topic" = String, Path, description = "Event topic"),
        SubscriptionQuery
    ),
    responses(
        (status = 200, description = "text/event-stream of lifecycle events"),
        (status = 404, description = "Unknown topic", body = crate::error::ErrorResponse)
    )
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    Query(query): Query<SubscriptionQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let topic: Topic = topic.parse()?;
    let wanted = query.id;

    let events = &state.services.events;
    let stream = events
        .subscribe(topic, move |event| wanted.map_or(true, |id| event.payload.id() == id))
        .map(|event| {
            Event::default()
                .event(event.topic.as_str())
                .id(event.payload.id().to_string())
                .json_data(&event.payload)
        });
    tracing::debug!(
        "New subscriber to {} (id filter {:?}, {} open)",
        topic,
        wanted,
        events.subscriber_count()
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
