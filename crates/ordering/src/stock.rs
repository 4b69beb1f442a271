//! The stock ledger: single source of truth for per-book available quantity.

use common::BookId;
use domain::OrderError;
use storage::{BookStore, ReserveOutcome};

use crate::error::{OrderingError, Result};

/// Enforces the non-negative-stock invariant for every book.
///
/// All stock mutations in the system flow through `reserve` and `restore`.
/// Both delegate to the store's atomic per-book arithmetic, so the new stock
/// value is durable before either returns and two concurrent reservations
/// can never jointly oversell a book.
pub struct StockLedger<S> {
    store: S,
}

impl<S: BookStore> StockLedger<S> {
    /// Creates a ledger over the given book store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reserves `quantity` copies of a book, decrementing its stock.
    ///
    /// Fails with `InsufficientStock` (and mutates nothing) when fewer than
    /// `quantity` copies are available. Returns the remaining stock.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(&self, book_id: BookId, quantity: u32) -> Result<i64> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity }.into());
        }

        match self.store.reserve_stock(book_id, quantity).await? {
            ReserveOutcome::Reserved { remaining } => {
                metrics::counter!("stock_reservations_total").increment(1);
                tracing::debug!(%book_id, quantity, remaining, "stock reserved");
                Ok(remaining)
            }
            ReserveOutcome::Insufficient { available } => {
                tracing::debug!(%book_id, quantity, available, "reservation refused");
                Err(OrderingError::InsufficientStock(book_id))
            }
            ReserveOutcome::NotFound => Err(OrderingError::BookNotFound(book_id)),
        }
    }

    /// Restores `quantity` copies of a book, incrementing its stock.
    ///
    /// Used by cancellation to give reserved stock back. Returns the new
    /// stock level.
    #[tracing::instrument(skip(self))]
    pub async fn restore(&self, book_id: BookId, quantity: u32) -> Result<i64> {
        let new_stock = self
            .store
            .restore_stock(book_id, quantity)
            .await?
            .ok_or(OrderingError::BookNotFound(book_id))?;

        metrics::counter!("stock_restitutions_total").increment(1);
        tracing::debug!(%book_id, quantity, new_stock, "stock restored");
        Ok(new_stock)
    }
}
