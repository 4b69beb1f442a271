//! The cart aggregate: a user's mutable pre-checkout line items.

use common::{BookId, CartLineId, UserId};
use domain::{CartLine, OrderError};
use storage::{BookStore, CartStore, UserDirectory};

use crate::error::{OrderingError, Result};

/// Maintains the pending line-item set for each user.
///
/// A user holds at most one line per book; adding the same book merges by
/// summing quantities. Quantities are validated against current stock as a
/// read-only check — nothing is reserved until checkout.
pub struct CartService<S> {
    store: S,
}

impl<S> CartService<S>
where
    S: CartStore + BookStore + UserDirectory,
{
    /// Creates a cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds `quantity` copies of a book to the user's cart, merging with an
    /// existing line for the same book.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: u32,
    ) -> Result<CartLine> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity }.into());
        }

        if !self.store.user_exists(user_id).await? {
            return Err(OrderingError::UserNotFound(user_id));
        }

        let book = self
            .store
            .book(book_id)
            .await?
            .ok_or(OrderingError::BookNotFound(book_id))?;

        match self.store.line_for_book(user_id, book_id).await? {
            Some(mut line) => {
                let merged = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(OrderError::InvalidQuantity { quantity })?;

                if !book.has_stock_for(merged) {
                    return Err(OrderingError::InsufficientStock(book_id));
                }

                self.store.set_line_quantity(line.cart_line_id, merged).await?;
                line.quantity = merged;
                tracing::debug!(%user_id, %book_id, merged, "cart line merged");
                Ok(line)
            }
            None => {
                if !book.has_stock_for(quantity) {
                    return Err(OrderingError::InsufficientStock(book_id));
                }

                let line = CartLine::new(user_id, book_id, quantity)?;
                self.store.insert_line(&line).await?;
                tracing::debug!(%user_id, %book_id, quantity, "cart line added");
                Ok(line)
            }
        }
    }

    /// Overwrites a line's quantity, re-validated against current stock.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(&self, cart_line_id: CartLineId, quantity: u32) -> Result<CartLine> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity }.into());
        }

        let mut line = self
            .store
            .line(cart_line_id)
            .await?
            .ok_or(OrderingError::CartLineNotFound(cart_line_id))?;

        let book = self
            .store
            .book(line.book_id)
            .await?
            .ok_or(OrderingError::BookNotFound(line.book_id))?;

        if !book.has_stock_for(quantity) {
            return Err(OrderingError::InsufficientStock(line.book_id));
        }

        if !self.store.set_line_quantity(cart_line_id, quantity).await? {
            return Err(OrderingError::CartLineNotFound(cart_line_id));
        }
        line.quantity = quantity;
        Ok(line)
    }

    /// Removes a single line from whatever cart owns it.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, cart_line_id: CartLineId) -> Result<()> {
        if !self.store.remove_line(cart_line_id).await? {
            return Err(OrderingError::CartLineNotFound(cart_line_id));
        }
        Ok(())
    }

    /// Removes all of a user's lines, returning how many were removed.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<u64> {
        Ok(self.store.clear_cart(user_id).await?)
    }

    /// Produces the user's lines in the order they were added.
    ///
    /// An empty vec is a valid result; it signals an empty cart to the
    /// caller, not an error at this layer.
    pub async fn snapshot(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        Ok(self.store.lines_for_user(user_id).await?)
    }
}
