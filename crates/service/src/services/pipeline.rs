//! End-to-end order placement.
//!
//! ```text
//! AwaitingPrincipal -> ResolvingCustomer -> PersistingOrder -> Dispatching -> Completed
//!         |                  |                    |
//!         +------------------+--------------------+--------> Rejected
//! ```
//!
//! Steps run sequentially. Only the notification runs detached; the order is
//! returned without waiting for it.

use std::fmt;

use tracing::{Instrument, debug, info_span, warn};

use orderdesk_core::{Amount, ItemLabel};

use super::directory::CustomerDirectory;
use super::ledger::OrderLedger;
use super::notify::Dispatcher;
use crate::context::RequestContext;
use crate::error::Result;
use crate::models::Order;

/// Stage of a single `place_order` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    AwaitingPrincipal,
    ResolvingCustomer,
    PersistingOrder,
    Dispatching,
    Completed,
    Rejected,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AwaitingPrincipal => "awaiting_principal",
            Self::ResolvingCustomer => "resolving_customer",
            Self::PersistingOrder => "persisting_order",
            Self::Dispatching => "dispatching",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Orchestrates directory, ledger and dispatcher for one order.
#[derive(Clone)]
pub struct OrderPipeline {
    directory: CustomerDirectory,
    ledger: OrderLedger,
    dispatcher: Dispatcher,
}

impl OrderPipeline {
    #[must_use]
    pub const fn new(
        directory: CustomerDirectory,
        ledger: OrderLedger,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            directory,
            ledger,
            dispatcher,
        }
    }

    /// Place an order for the principal in `ctx`.
    ///
    /// Item and amount are validated before anything is written. The
    /// customer is created on first order. The notification is sent in the
    /// background and its outcome never affects the result.
    ///
    /// # Errors
    ///
    /// - `CredentialMissing` if `ctx` has no principal
    /// - `InvalidInput` if `item` or `amount` is malformed
    /// - `Cancelled` if the caller aborted during a store call
    /// - a storage error from the directory or ledger
    pub async fn place_order(
        &self,
        ctx: &RequestContext,
        item: &str,
        amount: &str,
    ) -> Result<Order> {
        let span = info_span!("place_order", request_id = %ctx.request_id());
        async {
            let result = self.run(ctx, item, amount).await;
            if let Err(e) = &result {
                warn!(stage = %PipelineStage::Rejected, error = %e, "Order rejected");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, ctx: &RequestContext, item: &str, amount: &str) -> Result<Order> {
        debug!(stage = %PipelineStage::AwaitingPrincipal);
        let principal = ctx.principal()?;
        let item = ItemLabel::parse(item)?;
        let amount = Amount::parse(amount)?;

        debug!(stage = %PipelineStage::ResolvingCustomer);
        let customer = ctx
            .run(self.directory.resolve_or_create(principal))
            .await?;

        debug!(stage = %PipelineStage::PersistingOrder, customer_id = %customer.id());
        let order = ctx
            .run(self.ledger.create(customer.id(), item, amount))
            .await?;

        debug!(stage = %PipelineStage::Dispatching, order_id = %order.id());
        // Detached: the handle is dropped and the send outlives this call.
        drop(self.dispatcher.notify_order(&order));

        debug!(stage = %PipelineStage::Completed, order_id = %order.id());
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use orderdesk_core::Principal;
    use tokio::sync::mpsc;

    use super::*;
    use crate::db::MemoryStore;
    use crate::error::ErrorKind;
    use crate::services::notify::{NotificationGateway, NotificationRequest, NotifyError};

    struct ChannelGateway(mpsc::UnboundedSender<NotificationRequest>);

    #[async_trait]
    impl NotificationGateway for ChannelGateway {
        async fn send(&self, request: &NotificationRequest) -> std::result::Result<(), NotifyError> {
            let _ = self.0.send(request.clone());
            Ok(())
        }
    }

    fn pipeline() -> (
        OrderPipeline,
        MemoryStore,
        mpsc::UnboundedReceiver<NotificationRequest>,
    ) {
        let store = MemoryStore::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let pipeline = OrderPipeline::new(
            CustomerDirectory::new(Arc::new(store.clone())),
            OrderLedger::new(Arc::new(store.clone())),
            Dispatcher::new(Arc::new(ChannelGateway(tx)), "+254700000000"),
        );
        (pipeline, store, rx)
    }

    fn ctx(name: &str) -> RequestContext {
        RequestContext::authenticated(Principal::parse(name).unwrap())
    }

    #[tokio::test]
    async fn test_first_order_creates_customer_and_notifies() {
        let (pipeline, store, mut rx) = pipeline();

        let order = pipeline
            .place_order(&ctx("Dana@Example.com"), "widget", "3.00")
            .await
            .unwrap();

        assert_eq!(order.item().as_str(), "widget");
        assert_eq!(store.customer_count(), 1);
        let sent = rx.recv().await.unwrap();
        assert!(sent.message.contains(&format!("#{}", order.id())));
    }

    #[tokio::test]
    async fn test_anonymous_context_is_rejected_before_any_write() {
        let (pipeline, store, _rx) = pipeline();
        let err = pipeline
            .place_order(&RequestContext::anonymous(), "widget", "3.00")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialMissing);
        assert_eq!(store.customer_count(), 0);
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_amount_is_rejected_before_any_write() {
        let (pipeline, store, _rx) = pipeline();
        let err = pipeline
            .place_order(&ctx("dana@example.com"), "widget", "-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(store.customer_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_request_writes_nothing() {
        let (pipeline, store, _rx) = pipeline();
        let ctx = ctx("dana@example.com");
        ctx.cancellation().cancel();
        let err = pipeline.place_order(&ctx, "widget", "1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(store.order_count(), 0);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::PersistingOrder.to_string(), "persisting_order");
    }
}
