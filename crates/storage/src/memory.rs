use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BookId, CartLineId, OrderId, UserId};
use domain::{Book, CartLine, Order, OrderStatus, PaymentStatus};
use tokio::sync::RwLock;

use crate::{
    Result,
    store::{BookStore, CartStore, OrderStore, ReserveOutcome, UserDirectory, UserRecord},
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, UserRecord>,
    books: HashMap<BookId, Book>,
    cart_lines: HashMap<CartLineId, CartLine>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory storage backend for testing.
///
/// Stores everything behind a single lock and provides the same interface as
/// the PostgreSQL implementation. Multi-entity operations run inside one
/// write-lock scope, so they are atomic with respect to every other
/// operation on the store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stock level of a book, for assertions in tests.
    pub async fn stock_of(&self, book_id: BookId) -> Option<i64> {
        self.state
            .read()
            .await
            .books
            .get(&book_id)
            .map(|book| book.stock_quantity)
    }

    /// Returns the total number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all stored data.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.users.clear();
        state.books.clear();
        state.cart_lines.clear();
        state.orders.clear();
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn insert_user(&self, user: &UserRecord) -> Result<()> {
        self.state
            .write()
            .await
            .users
            .insert(user.user_id, user.clone());
        Ok(())
    }

    async fn user_exists(&self, user_id: UserId) -> Result<bool> {
        Ok(self.state.read().await.users.contains_key(&user_id))
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert_book(&self, book: &Book) -> Result<()> {
        self.state
            .write()
            .await
            .books
            .insert(book.book_id, book.clone());
        Ok(())
    }

    async fn book(&self, book_id: BookId) -> Result<Option<Book>> {
        Ok(self.state.read().await.books.get(&book_id).cloned())
    }

    async fn reserve_stock(&self, book_id: BookId, quantity: u32) -> Result<ReserveOutcome> {
        let mut state = self.state.write().await;

        let Some(book) = state.books.get_mut(&book_id) else {
            return Ok(ReserveOutcome::NotFound);
        };

        let requested = i64::from(quantity);
        if book.stock_quantity < requested {
            return Ok(ReserveOutcome::Insufficient {
                available: book.stock_quantity,
            });
        }

        book.stock_quantity -= requested;
        Ok(ReserveOutcome::Reserved {
            remaining: book.stock_quantity,
        })
    }

    async fn restore_stock(&self, book_id: BookId, quantity: u32) -> Result<Option<i64>> {
        let mut state = self.state.write().await;

        let Some(book) = state.books.get_mut(&book_id) else {
            return Ok(None);
        };

        book.stock_quantity += i64::from(quantity);
        Ok(Some(book.stock_quantity))
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn insert_line(&self, line: &CartLine) -> Result<()> {
        self.state
            .write()
            .await
            .cart_lines
            .insert(line.cart_line_id, line.clone());
        Ok(())
    }

    async fn line(&self, cart_line_id: CartLineId) -> Result<Option<CartLine>> {
        Ok(self.state.read().await.cart_lines.get(&cart_line_id).cloned())
    }

    async fn line_for_book(&self, user_id: UserId, book_id: BookId) -> Result<Option<CartLine>> {
        let state = self.state.read().await;
        Ok(state
            .cart_lines
            .values()
            .find(|line| line.user_id == user_id && line.book_id == book_id)
            .cloned())
    }

    async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        let state = self.state.read().await;
        let mut lines: Vec<_> = state
            .cart_lines
            .values()
            .filter(|line| line.user_id == user_id)
            .cloned()
            .collect();
        lines.sort_by_key(|line| line.added_at);
        Ok(lines)
    }

    async fn set_line_quantity(&self, cart_line_id: CartLineId, quantity: u32) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.cart_lines.get_mut(&cart_line_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_line(&self, cart_line_id: CartLineId) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.cart_lines.remove(&cart_line_id).is_some())
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.cart_lines.len();
        state.cart_lines.retain(|_, line| line.user_id != user_id);
        Ok((before - state.cart_lines.len()) as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn commit_checkout(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        state.orders.insert(order.order_id, order.clone());
        state
            .cart_lines
            .retain(|_, line| line.user_id != order.user_id);
        Ok(())
    }

    async fn order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(&order_id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_payment_status(
        &self,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(&order_id) {
            Some(order) => {
                order.payment_status = payment_status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn transition_status(
        &self,
        order_id: OrderId,
        from: &[OrderStatus],
        to: OrderStatus,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(&order_id) {
            Some(order) if from.contains(&order.status) => {
                order.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
