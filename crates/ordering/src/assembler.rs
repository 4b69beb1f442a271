//! The checkout transaction: converts a cart snapshot into a persisted order.

use common::{BookId, UserId};
use domain::{Order, OrderError, OrderItem, PaymentMethod, ShippingDetails};
use storage::{BookStore, CartStore, OrderStore, UserDirectory};

use crate::error::{OrderingError, Result};
use crate::stock::StockLedger;

/// Everything a caller supplies at checkout.
///
/// The payment method arrives as a raw string and is parsed here, so an
/// unrecognized value fails before any side effect.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: UserId,
    pub shipping_address: String,
    pub phone_number: String,
    pub payment_method: String,
    pub notes: Option<String>,
}

/// The sole authority for turning a cart into an order.
///
/// Checkout is all-or-nothing: every stock reservation applied during a
/// failed attempt is rolled back before the error is returned, and the order
/// becomes visible to readers only after order, items, and the cart clear
/// have committed as one durable unit.
pub struct OrderAssembler<S> {
    store: S,
    ledger: StockLedger<S>,
}

impl<S> OrderAssembler<S>
where
    S: BookStore + CartStore + OrderStore + UserDirectory + Clone,
{
    /// Creates an assembler over the given store.
    pub fn new(store: S) -> Self {
        let ledger = StockLedger::new(store.clone());
        Self { store, ledger }
    }

    /// Runs the checkout transaction for a user.
    ///
    /// On success the returned order is `PENDING` / `UNPAID`, stock reflects
    /// every reservation, and the user's cart is empty. On failure stock and
    /// cart are unchanged from their pre-call state.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn place_order(&self, request: CheckoutRequest) -> Result<Order> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = std::time::Instant::now();

        let payment_method = PaymentMethod::parse(&request.payment_method).ok_or_else(|| {
            OrderError::InvalidPaymentMethod(request.payment_method.clone())
        })?;

        if !self.store.user_exists(request.user_id).await? {
            return Err(OrderingError::UserNotFound(request.user_id));
        }

        let lines = self.store.lines_for_user(request.user_id).await?;
        if lines.is_empty() {
            return Err(OrderingError::EmptyCart);
        }

        // Reserve stock line by line, capturing the price at this moment.
        // Any failure from here on must give back what was already taken.
        let mut reserved: Vec<(BookId, u32)> = Vec::with_capacity(lines.len());
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let book = match self.store.book(line.book_id).await {
                Ok(Some(book)) => book,
                Ok(None) => {
                    self.roll_back(&reserved).await;
                    return Err(OrderingError::BookNotFound(line.book_id));
                }
                Err(error) => {
                    self.roll_back(&reserved).await;
                    return Err(error.into());
                }
            };

            if let Err(error) = self.ledger.reserve(line.book_id, line.quantity).await {
                self.roll_back(&reserved).await;
                return Err(error);
            }
            reserved.push((line.book_id, line.quantity));

            match OrderItem::new(line.book_id, line.quantity, book.price) {
                Ok(item) => items.push(item),
                Err(error) => {
                    self.roll_back(&reserved).await;
                    return Err(error.into());
                }
            }
        }

        let shipping = ShippingDetails {
            shipping_address: request.shipping_address,
            phone_number: request.phone_number,
            notes: request.notes,
        };
        let order = match Order::place(request.user_id, shipping, payment_method, items) {
            Ok(order) => order,
            Err(error) => {
                self.roll_back(&reserved).await;
                return Err(error.into());
            }
        };

        if let Err(error) = self.store.commit_checkout(&order).await {
            self.roll_back(&reserved).await;
            return Err(error.into());
        }

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.order_id,
            total = %order.total_amount,
            lines = order.items.len(),
            "order placed"
        );

        Ok(order)
    }

    /// Restores every reservation applied during a failed checkout, in
    /// reverse order. Failures here are logged rather than propagated so the
    /// original checkout error reaches the caller.
    async fn roll_back(&self, reserved: &[(BookId, u32)]) {
        for (book_id, quantity) in reserved.iter().rev() {
            if let Err(error) = self.ledger.restore(*book_id, *quantity).await {
                tracing::error!(%book_id, quantity, %error, "failed to roll back stock reservation");
            }
        }

        if !reserved.is_empty() {
            metrics::counter!("checkout_rollbacks_total").increment(1);
            tracing::warn!(lines = reserved.len(), "checkout rolled back");
        }
    }
}
