//! Domain types for the bookstore ordering engine.
//!
//! This crate provides the core domain model:
//! - `Book`, the slice of the catalog the engine touches (price and stock)
//! - `CartLine`, a user's pending line item
//! - `Order` and `OrderItem`, the order aggregate created at checkout
//! - `OrderStatus` / `PaymentStatus` / `PaymentMethod` enumerations and the
//!   order status state machine
//! - `Money`, fixed-point currency amounts in cents
//!
//! All types are plain data with validating constructors; persistence and
//! orchestration live in the `storage` and `ordering` crates.

pub mod book;
pub mod cart;
pub mod error;
pub mod order;

pub use book::Book;
pub use cart::CartLine;
pub use error::OrderError;
pub use order::{
    Money, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, ShippingDetails,
};
