//! Domain validation errors.

use thiserror::Error;

use crate::order::OrderStatus;

/// Errors raised by domain-level validation and state transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// A requested quantity was zero or otherwise unusable.
    #[error("invalid quantity: {quantity}")]
    InvalidQuantity { quantity: u32 },

    /// A payment method string did not match any known method.
    #[error("unrecognized payment method: {0}")]
    InvalidPaymentMethod(String),

    /// The order's current status does not permit the requested transition.
    #[error("cannot {action} order in {status} status")]
    InvalidStatusTransition {
        status: OrderStatus,
        action: &'static str,
    },

    /// An amount computation overflowed the representable range.
    #[error("order amount arithmetic overflow")]
    AmountOverflow,
}
