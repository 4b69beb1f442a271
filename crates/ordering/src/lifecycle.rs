//! Order lifecycle operations: status transitions and cancellation.

use common::{OrderId, UserId};
use domain::{Order, OrderError, OrderStatus, PaymentStatus};
use storage::{BookStore, OrderStore};

use crate::error::{OrderingError, Result};
use crate::stock::StockLedger;

/// Governs an order after it has been placed.
///
/// Cancellation is the only gated transition; it wins the status change
/// through a conditional store update (so concurrent cancellations of the
/// same order have exactly one winner) and then durably restores stock for
/// every item before reporting success. Other status updates are applied
/// without a transition table, preserving the administrative override
/// semantics of the surrounding system.
pub struct OrderLifecycle<S> {
    store: S,
    ledger: StockLedger<S>,
}

impl<S> OrderLifecycle<S>
where
    S: OrderStore + BookStore + Clone,
{
    /// Creates a lifecycle service over the given store.
    pub fn new(store: S) -> Self {
        let ledger = StockLedger::new(store.clone());
        Self { store, ledger }
    }

    /// Loads an order with its items.
    pub async fn order(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .order(order_id)
            .await?
            .ok_or(OrderingError::OrderNotFound(order_id))
    }

    /// Loads a user's orders, most recent first.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// Sets the order status. No transition gating is applied.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        if !self.store.set_status(order_id, status).await? {
            return Err(OrderingError::OrderNotFound(order_id));
        }
        tracing::info!(%order_id, %status, "order status updated");
        self.order(order_id).await
    }

    /// Sets the payment status. Independent of the order status; no
    /// cross-validation is applied.
    #[tracing::instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<Order> {
        if !self.store.set_payment_status(order_id, payment_status).await? {
            return Err(OrderingError::OrderNotFound(order_id));
        }
        tracing::info!(%order_id, %payment_status, "payment status updated");
        self.order(order_id).await
    }

    /// Cancels an order and gives its stock back.
    ///
    /// Legal only while the order is `PENDING` or `CONFIRMED`. The restored
    /// stock is durably persisted before this returns.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId) -> Result<Order> {
        let mut order = self.order(order_id).await?;
        order.cancel()?;

        let won = self
            .store
            .transition_status(order_id, OrderStatus::CANCELLABLE, OrderStatus::Cancelled)
            .await?;
        if !won {
            // Lost a race with a concurrent transition on the same order;
            // report against the status that is now visible.
            let current = self.order(order_id).await?;
            return Err(OrderError::InvalidStatusTransition {
                status: current.status,
                action: "cancel",
            }
            .into());
        }

        for item in &order.items {
            self.ledger.restore(item.book_id, item.quantity).await?;
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, lines = order.items.len(), "order cancelled, stock restored");
        Ok(order)
    }
}
