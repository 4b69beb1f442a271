use async_trait::async_trait;
use common::{BookId, CartLineId, OrderId, UserId};
use domain::{Book, CartLine, Order, OrderStatus, PaymentStatus};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Outcome of an atomic stock reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Stock was decremented; `remaining` is the new stock level.
    Reserved { remaining: i64 },

    /// Current stock is below the requested quantity; nothing was mutated.
    Insufficient { available: i64 },

    /// No book with the given ID exists.
    NotFound,
}

/// Minimal user directory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub email: String,
    pub full_name: String,
}

/// Lookup of registered users.
///
/// User management itself (registration, authentication) is owned by another
/// part of the system; the engine only needs existence checks.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Inserts a user record.
    async fn insert_user(&self, user: &UserRecord) -> Result<()>;

    /// Returns true if a user with the given ID exists.
    async fn user_exists(&self, user_id: UserId) -> Result<bool>;
}

/// Book records and the per-book stock level.
///
/// `reserve_stock` and `restore_stock` are the only stock mutations the
/// engine performs. Both must be atomic per book and durable before they
/// return: concurrent reservations against the same book must never both
/// succeed when their combined quantity exceeds the available stock, and
/// reservations against different books must not contend with each other.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Inserts a book record.
    async fn insert_book(&self, book: &Book) -> Result<()>;

    /// Loads a book by ID.
    async fn book(&self, book_id: BookId) -> Result<Option<Book>>;

    /// Atomically decrements stock by `quantity` if and only if the current
    /// stock is at least `quantity`. On `Insufficient` no mutation happens.
    async fn reserve_stock(&self, book_id: BookId, quantity: u32) -> Result<ReserveOutcome>;

    /// Atomically increments stock by `quantity`. Returns the new stock
    /// level, or None if the book does not exist.
    async fn restore_stock(&self, book_id: BookId, quantity: u32) -> Result<Option<i64>>;
}

/// Persistence for pending cart lines.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Inserts a new cart line.
    async fn insert_line(&self, line: &CartLine) -> Result<()>;

    /// Loads a single line by ID.
    async fn line(&self, cart_line_id: CartLineId) -> Result<Option<CartLine>>;

    /// Loads the unique line for a `(user, book)` pair, if present.
    async fn line_for_book(&self, user_id: UserId, book_id: BookId) -> Result<Option<CartLine>>;

    /// Loads all of a user's lines, ordered by the time they were added.
    async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>>;

    /// Overwrites a line's quantity. Returns false if the line is absent.
    async fn set_line_quantity(&self, cart_line_id: CartLineId, quantity: u32) -> Result<bool>;

    /// Deletes a line. Returns false if the line was absent.
    async fn remove_line(&self, cart_line_id: CartLineId) -> Result<bool>;

    /// Deletes all of a user's lines, returning how many were removed.
    async fn clear_cart(&self, user_id: UserId) -> Result<u64>;
}

/// Persistence for placed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a freshly assembled order (header and items) and clears the
    /// owning user's cart, as one durable unit. The order is visible to
    /// readers only after the whole unit has committed.
    async fn commit_checkout(&self, order: &Order) -> Result<()>;

    /// Loads an order with its items.
    async fn order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Loads all orders of a user, most recent first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Sets the order status unconditionally. Returns false if the order is
    /// absent.
    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<bool>;

    /// Sets the payment status unconditionally. Returns false if the order
    /// is absent.
    async fn set_payment_status(
        &self,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<bool>;

    /// Sets the status to `to` if and only if the current status is one of
    /// `from`, as a single atomic action. Returns true when this caller won
    /// the transition. Concurrent callers racing on the same order see at
    /// most one `true`.
    async fn transition_status(
        &self,
        order_id: OrderId,
        from: &[OrderStatus],
        to: OrderStatus,
    ) -> Result<bool>;
}
