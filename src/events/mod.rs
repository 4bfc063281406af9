use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted after a cart or catalog change has been committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    CartCreated {
        cart_id: Uuid,
        user_id: i64,
    },
    CartItemAdded {
        cart_id: Uuid,
        product_id: i64,
        line_item_id: Uuid,
    },
    CartItemUpdated {
        cart_id: Uuid,
        product_id: i64,
        line_item_id: Uuid,
        quantity: i32,
    },
    CartItemRemoved {
        cart_id: Uuid,
        product_id: i64,
        line_item_id: Uuid,
    },
    CartCheckedOut {
        cart_id: Uuid,
        user_id: i64,
    },
    ProductCreated(i64),
    ProductDeleted(i64),
}

impl Event {
    /// Stable name used in logs and metrics labels
    pub fn name(&self) -> &'static str {
        match self {
            Event::CartCreated { .. } => "cart_created",
            Event::CartItemAdded { .. } => "cart_item_added",
            Event::CartItemUpdated { .. } => "cart_item_updated",
            Event::CartItemRemoved { .. } => "cart_item_removed",
            Event::CartCheckedOut { .. } => "cart_checked_out",
            Event::ProductCreated(_) => "product_created",
            Event::ProductDeleted(_) => "product_deleted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    ///
    /// Event delivery never rolls back a committed mutation.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            counter!("storefront_cart.events.dropped", 1);
            warn!(event = name, error = %e, "event dropped");
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("storefront_cart.events.processed", 1);
        match &event {
            Event::CartCreated { cart_id, user_id } => {
                info!(%cart_id, user_id, "cart created");
            }
            Event::CartItemAdded {
                cart_id,
                product_id,
                line_item_id,
            } => {
                info!(%cart_id, product_id, %line_item_id, "cart item added");
            }
            Event::CartItemUpdated {
                cart_id,
                product_id,
                line_item_id,
                quantity,
            } => {
                info!(%cart_id, product_id, %line_item_id, quantity, "cart item updated");
            }
            Event::CartItemRemoved {
                cart_id,
                product_id,
                line_item_id,
            } => {
                info!(%cart_id, product_id, %line_item_id, "cart item removed");
            }
            Event::CartCheckedOut { cart_id, user_id } => {
                info!(%cart_id, user_id, "cart checked out");
            }
            Event::ProductCreated(id) => info!(product_id = id, "product created"),
            Event::ProductDeleted(id) => info!(product_id = id, "product deleted"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_survives_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        sender.send_or_log(Event::ProductCreated(1)).await;
        assert!(sender.send(Event::ProductDeleted(1)).await.is_err());
    }

    #[tokio::test]
    async fn process_events_stops_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send(Event::CartCreated {
                cart_id: Uuid::new_v4(),
                user_id: 7,
            })
            .await
            .unwrap();
        drop(sender);
        process_events(rx).await;
    }

    #[test]
    fn event_names_are_snake_case() {
        assert_eq!(Event::ProductCreated(1).name(), "product_created");
        assert_eq!(
            Event::CartCheckedOut {
                cart_id: Uuid::nil(),
                user_id: 1
            }
            .name(),
            "cart_checked_out"
        );
    }
}
