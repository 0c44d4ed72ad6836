//! Lifecycle event notifier
//!
//! Fire-and-forget fan-out over a tokio broadcast channel. Subscribers
//! receive a lazy, infinite stream for one topic and filter it themselves.

use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    error::AppError,
    models::{Checkout, Order},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Topic {
    #[serde(rename = "latestOrder")]
    LatestOrder,
    #[serde(rename = "updatedOrder")]
    UpdatedOrder,
    #[serde(rename = "latestCheckout")]
    LatestCheckout,
    #[serde(rename = "updatedCheckout")]
    UpdatedCheckout,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::LatestOrder => "latestOrder",
            Topic::UpdatedOrder => "updatedOrder",
            Topic::LatestCheckout => "latestCheckout",
            Topic::UpdatedCheckout => "updatedCheckout",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Topic {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latestOrder" => Ok(Topic::LatestOrder),
            "updatedOrder" => Ok(Topic::UpdatedOrder),
            "latestCheckout" => Ok(Topic::LatestCheckout),
            "updatedCheckout" => Ok(Topic::UpdatedCheckout),
            _ => Err(AppError::NotFound(format!("Unknown topic: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    Order(Order),
    Checkout(Checkout),
}

impl EventPayload {
    /// Identity subscribers filter on (order id or checkout id)
    pub fn id(&self) -> i32 {
        match self {
            EventPayload::Order(order) => order.id,
            EventPayload::Checkout(checkout) => checkout.id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    pub topic: Topic,
    pub payload: EventPayload,
}

#[derive(Clone)]
pub struct EventNotifier {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Emit an event; having no subscribers is not an error
    pub fn publish(&self, topic: Topic, payload: EventPayload) {
        let id = payload.id();
        match self.sender.send(LifecycleEvent { topic, payload }) {
            Ok(receivers) => tracing::debug!("Published {} #{} to {} subscriber(s)", topic, id, receivers),
            Err(_) => tracing::debug!("Published {} #{} with no subscribers", topic, id),
        }
    }

    /// Events of one topic accepted by `filter`, from now on.
    ///
    /// A subscriber that falls behind by more than the channel capacity skips
    /// the events it missed.
    pub fn subscribe<F>(&self, topic: Topic, filter: F) -> impl Stream<Item = LifecycleEvent> + Send + 'static
    where
        F: Fn(&LifecycleEvent) -> bool + Send + 'static,
    {
        BroadcastStream::new(self.sender.subscribe()).filter_map(move |received| match received {
            Ok(event) if event.topic == topic && filter(&event) => Some(event),
            Ok(_) => None,
            Err(lagged) => {
                tracing::warn!("Subscriber to {} lagged: {}", topic, lagged);
                None
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
