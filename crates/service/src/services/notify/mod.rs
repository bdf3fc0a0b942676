//! Best-effort order notifications.
//!
//! [`Dispatcher::dispatch`] hands a message to a background task and returns
//! immediately. The task makes one delivery attempt; a failure is logged and
//! never reaches the code path that placed the order.
//!
//! In-flight sends are tracked so a short-lived process can wait for them
//! with [`Dispatcher::drain`] before exiting.

pub mod sms;

pub use sms::SmsGateway;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::models::Order;

/// Errors from a notification gateway.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Request could not be built.
    #[error("invalid request: {0}")]
    Invalid(String),
}

/// A single outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    /// Recipient address (phone number for SMS).
    pub destination: String,
    /// Message body.
    pub message: String,
}

/// External message delivery service.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Deliver one message.
    async fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError>;
}

/// Fire-and-forget front for a [`NotificationGateway`].
#[derive(Clone)]
pub struct Dispatcher {
    gateway: Arc<dyn NotificationGateway>,
    destination: String,
    tracker: TaskTracker,
}

impl Dispatcher {
    /// Create a dispatcher that sends order notifications to `destination`.
    #[must_use]
    pub fn new(gateway: Arc<dyn NotificationGateway>, destination: impl Into<String>) -> Self {
        Self {
            gateway,
            destination: destination.into(),
            tracker: TaskTracker::new(),
        }
    }

    /// Queue a notification for a freshly persisted order.
    pub fn notify_order(&self, order: &Order) -> JoinHandle<()> {
        self.dispatch(NotificationRequest {
            destination: self.destination.clone(),
            message: render_order_message(order),
        })
    }

    /// Send `request` on a detached task.
    ///
    /// The returned handle only signals completion; delivery failures are
    /// logged, not returned. Dropping the handle does not cancel the send.
    pub fn dispatch(&self, request: NotificationRequest) -> JoinHandle<()> {
        let gateway = Arc::clone(&self.gateway);
        self.tracker.spawn(async move {
            match gateway.send(&request).await {
                Ok(()) => debug!("Notification delivered"),
                Err(e) => warn!(error = %e, "Failed to deliver notification"),
            }
        })
    }

    /// Wait for every notification dispatched so far to finish.
    ///
    /// Sends are never cancelled; this only waits. Dispatching remains
    /// possible afterwards.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

/// Message sent to the customer once an order is persisted.
#[must_use]
pub fn render_order_message(order: &Order) -> String {
    format!(
        "Your order #{} ({}) has been received and is on its way.",
        order.id(),
        order.item()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use orderdesk_core::{Amount, CustomerId, ItemLabel, OrderId};

    use super::*;

    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<NotificationRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationGateway for RecordingGateway {
        async fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(NotifyError::Api {
                    status: 401,
                    message: "bad key".to_owned(),
                });
            }
            Ok(())
        }
    }

    fn order() -> Order {
        Order::from_stored(
            OrderId::new(42),
            CustomerId::new(1),
            ItemLabel::parse("widget").unwrap(),
            Amount::parse("9.99").unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn test_render_order_message() {
        assert_eq!(
            render_order_message(&order()),
            "Your order #42 (widget) has been received and is on its way."
        );
    }

    #[tokio::test]
    async fn test_notify_order_sends_to_configured_destination() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = Dispatcher::new(gateway.clone(), "+254700000000");

        dispatcher.notify_order(&order()).await.unwrap();

        let sent = gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination, "+254700000000");
        assert!(sent[0].message.contains("#42"));
    }

    #[tokio::test]
    async fn test_failed_send_is_swallowed_after_one_attempt() {
        let gateway = Arc::new(RecordingGateway {
            fail: true,
            ..RecordingGateway::default()
        });
        let dispatcher = Dispatcher::new(gateway.clone(), "+254700000000");

        // The task completes normally even though delivery failed.
        dispatcher.notify_order(&order()).await.unwrap();
        assert_eq!(gateway.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drain_waits_for_detached_sends() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = Dispatcher::new(gateway.clone(), "+254700000000");

        drop(dispatcher.notify_order(&order()));
        drop(dispatcher.notify_order(&order()));
        dispatcher.drain().await;

        assert_eq!(gateway.sent.lock().unwrap().len(), 2);
    }
}
