//! The order aggregate: header, items, status machine, and value objects.

mod status;
mod value_objects;

pub use status::{OrderStatus, PaymentMethod, PaymentStatus};
pub use value_objects::{Money, OrderItem};

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Delivery details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub shipping_address: String,
    pub phone_number: String,
    pub notes: Option<String>,
}

/// A placed order together with its items.
///
/// The order owns its items by value; they are loaded and saved together as
/// one aggregate. After creation, only `status` and `payment_status` change.
/// Orders are never deleted; cancellation is a status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub order_id: OrderId,

    /// Customer who placed the order.
    pub user_id: UserId,

    /// When the order was placed.
    pub order_date: DateTime<Utc>,

    /// Sum of item subtotals.
    pub total_amount: Money,

    /// Current fulfillment status.
    pub status: OrderStatus,

    /// How the customer chose to pay.
    pub payment_method: PaymentMethod,

    /// Whether payment has been received.
    pub payment_status: PaymentStatus,

    /// Delivery address.
    pub shipping_address: String,

    /// Contact phone number.
    pub phone_number: String,

    /// Optional free-form customer notes.
    pub notes: Option<String>,

    /// The purchased lines, with price snapshots.
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Assembles a new order from checkout data.
    ///
    /// The total amount is computed as the checked sum of item subtotals, so
    /// `total_amount == Σ item.subtotal` holds by construction. The order
    /// starts `PENDING` / `UNPAID`.
    pub fn place(
        user_id: UserId,
        shipping: ShippingDetails,
        payment_method: PaymentMethod,
        items: Vec<OrderItem>,
    ) -> Result<Self, OrderError> {
        let total_amount = Money::checked_sum(items.iter().map(|item| &item.subtotal))
            .ok_or(OrderError::AmountOverflow)?;

        Ok(Self {
            order_id: OrderId::new(),
            user_id,
            order_date: Utc::now(),
            total_amount,
            status: OrderStatus::Pending,
            payment_method,
            payment_status: PaymentStatus::Unpaid,
            shipping_address: shipping.shipping_address,
            phone_number: shipping.phone_number,
            notes: shipping.notes,
            items,
        })
    }

    /// Cancels the order.
    ///
    /// Legal only while the status is `PENDING` or `CONFIRMED`.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStatusTransition {
                status: self.status,
                action: "cancel",
            });
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }

    /// Sets the order status without gating the transition.
    ///
    /// Any target status is accepted; administrative callers may move an
    /// order backwards or out of a terminal status.
    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }

    /// Sets the payment status. Independent of the order status.
    pub fn set_payment_status(&mut self, payment_status: PaymentStatus) {
        self.payment_status = payment_status;
    }

    /// Recomputes the sum of item subtotals.
    pub fn items_total(&self) -> Option<Money> {
        Money::checked_sum(self.items.iter().map(|item| &item.subtotal))
    }

    /// Total quantity across all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
