//! The caller-facing error taxonomy of the ordering engine.

use common::{BookId, CartLineId, OrderId, UserId};
use domain::OrderError;
use storage::StorageError;
use thiserror::Error;

/// Errors reported by the engine's operations.
///
/// Every failure is a recoverable domain error returned to the caller; the
/// engine never panics on bad input and never leaves partial state behind a
/// failed checkout.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// Checkout attempted with no cart lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A stock reservation could not be satisfied.
    #[error("insufficient stock for book {0}")]
    InsufficientStock(BookId),

    /// Referenced book does not exist.
    #[error("book not found: {0}")]
    BookNotFound(BookId),

    /// Referenced user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Referenced order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Referenced cart line does not exist.
    #[error("cart line not found: {0}")]
    CartLineNotFound(CartLineId),

    /// Domain validation failed (quantity, payment method, status transition).
    #[error(transparent)]
    Domain(#[from] OrderError),

    /// Storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, OrderingError>;
