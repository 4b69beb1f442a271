//! Cart line items.

use chrono::{DateTime, Utc};
use common::{BookId, CartLineId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// One pending line in a user's cart.
///
/// A user has at most one line per book; adding the same book again merges
/// by summing quantities. Lines are destroyed on checkout or explicit
/// removal, never carried into the order (the order takes a price snapshot
/// of its own).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub cart_line_id: CartLineId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a new cart line. Quantity must be at least 1.
    pub fn new(user_id: UserId, book_id: BookId, quantity: u32) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }

        Ok(Self {
            cart_line_id: CartLineId::new(),
            user_id,
            book_id,
            quantity,
            added_at: Utc::now(),
        })
    }
}
