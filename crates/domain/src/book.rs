//! The catalog slice the ordering engine reads and mutates.

use common::BookId;
use serde::{Deserialize, Serialize};

use crate::order::Money;

/// A book as seen by the ordering engine: identity, price, and stock.
///
/// The catalog owns the full book record (author, ISBN, cover, ...); the
/// engine only reads the price and mutates the stock level through the
/// stock ledger. `stock_quantity >= 0` must hold after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub price: Money,
    pub stock_quantity: i64,
}

impl Book {
    /// Creates a book with a fresh identifier.
    pub fn new(title: impl Into<String>, price: Money, stock_quantity: i64) -> Self {
        Self {
            book_id: BookId::new(),
            title: title.into(),
            price,
            stock_quantity,
        }
    }

    /// Returns true if `quantity` copies are currently in stock.
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock_quantity >= i64::from(quantity)
    }
}
