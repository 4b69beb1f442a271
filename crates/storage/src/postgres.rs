use async_trait::async_trait;
use common::{BookId, CartLineId, OrderId, UserId};
use domain::{Book, CartLine, Money, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StorageError,
    store::{BookStore, CartStore, OrderStore, ReserveOutcome, UserDirectory, UserRecord},
};

/// PostgreSQL-backed storage implementation.
///
/// Per-book stock arithmetic is expressed as single conditional `UPDATE`
/// statements, so reservations serialize on the book row and never on each
/// other across different books. Multi-row units (checkout commit) run in
/// explicit transactions.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_book(row: PgRow) -> Result<Book> {
        Ok(Book {
            book_id: BookId::from_uuid(row.try_get::<Uuid, _>("book_id")?),
            title: row.try_get("title")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock_quantity: row.try_get("stock_quantity")?,
        })
    }

    fn row_to_cart_line(row: PgRow) -> Result<CartLine> {
        let quantity: i64 = row.try_get("quantity")?;
        Ok(CartLine {
            cart_line_id: CartLineId::from_uuid(row.try_get::<Uuid, _>("cart_line_id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            book_id: BookId::from_uuid(row.try_get::<Uuid, _>("book_id")?),
            quantity: u32::try_from(quantity).map_err(|_| StorageError::Decode {
                column: "quantity",
                value: quantity.to_string(),
            })?,
            added_at: row.try_get("added_at")?,
        })
    }

    fn row_to_order_header(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let payment_method: String = row.try_get("payment_method")?;
        let payment_status: String = row.try_get("payment_status")?;

        Ok(Order {
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            order_date: row.try_get("order_date")?,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            status: OrderStatus::parse(&status).ok_or(StorageError::Decode {
                column: "status",
                value: status,
            })?,
            payment_method: PaymentMethod::parse(&payment_method).ok_or(StorageError::Decode {
                column: "payment_method",
                value: payment_method,
            })?,
            payment_status: PaymentStatus::parse(&payment_status).ok_or(StorageError::Decode {
                column: "payment_status",
                value: payment_status,
            })?,
            shipping_address: row.try_get("shipping_address")?,
            phone_number: row.try_get("phone_number")?,
            notes: row.try_get("notes")?,
            items: Vec::new(),
        })
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
        let quantity: i64 = row.try_get("quantity")?;
        Ok(OrderItem {
            book_id: BookId::from_uuid(row.try_get::<Uuid, _>("book_id")?),
            quantity: u32::try_from(quantity).map_err(|_| StorageError::Decode {
                column: "quantity",
                value: quantity.to_string(),
            })?,
            price_at_purchase: Money::from_cents(row.try_get("price_at_purchase_cents")?),
            subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
        })
    }

    async fn items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT book_id, quantity, price_at_purchase_cents, subtotal_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY book_id
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order_item).collect()
    }
}

#[async_trait]
impl UserDirectory for PostgresStore {
    async fn insert_user(&self, user: &UserRecord) -> Result<()> {
        sqlx::query("INSERT INTO users (user_id, email, full_name) VALUES ($1, $2, $3)")
            .bind(user.user_id.as_uuid())
            .bind(&user.email)
            .bind(&user.full_name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn user_exists(&self, user_id: UserId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)")
                .bind(user_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl BookStore for PostgresStore {
    async fn insert_book(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (book_id, title, price_cents, stock_quantity)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(book.book_id.as_uuid())
        .bind(&book.title)
        .bind(book.price.cents())
        .bind(book.stock_quantity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn book(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            "SELECT book_id, title, price_cents, stock_quantity FROM books WHERE book_id = $1",
        )
        .bind(book_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_book).transpose()
    }

    async fn reserve_stock(&self, book_id: BookId, quantity: u32) -> Result<ReserveOutcome> {
        // Single conditional UPDATE: the row lock makes the check-and-decrement
        // atomic per book.
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE books
            SET stock_quantity = stock_quantity - $2
            WHERE book_id = $1 AND stock_quantity >= $2
            RETURNING stock_quantity
            "#,
        )
        .bind(book_id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(remaining) = remaining {
            return Ok(ReserveOutcome::Reserved { remaining });
        }

        let available: Option<i64> =
            sqlx::query_scalar("SELECT stock_quantity FROM books WHERE book_id = $1")
                .bind(book_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(match available {
            Some(available) => ReserveOutcome::Insufficient { available },
            None => ReserveOutcome::NotFound,
        })
    }

    async fn restore_stock(&self, book_id: BookId, quantity: u32) -> Result<Option<i64>> {
        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE books
            SET stock_quantity = stock_quantity + $2
            WHERE book_id = $1
            RETURNING stock_quantity
            "#,
        )
        .bind(book_id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        Ok(new_stock)
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn insert_line(&self, line: &CartLine) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (cart_line_id, user_id, book_id, quantity, added_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(line.cart_line_id.as_uuid())
        .bind(line.user_id.as_uuid())
        .bind(line.book_id.as_uuid())
        .bind(i64::from(line.quantity))
        .bind(line.added_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn line(&self, cart_line_id: CartLineId) -> Result<Option<CartLine>> {
        let row = sqlx::query(
            r#"
            SELECT cart_line_id, user_id, book_id, quantity, added_at
            FROM cart_lines
            WHERE cart_line_id = $1
            "#,
        )
        .bind(cart_line_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_line).transpose()
    }

    async fn line_for_book(&self, user_id: UserId, book_id: BookId) -> Result<Option<CartLine>> {
        let row = sqlx::query(
            r#"
            SELECT cart_line_id, user_id, book_id, quantity, added_at
            FROM cart_lines
            WHERE user_id = $1 AND book_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(book_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_line).transpose()
    }

    async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT cart_line_id, user_id, book_id, quantity, added_at
            FROM cart_lines
            WHERE user_id = $1
            ORDER BY added_at ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cart_line).collect()
    }

    async fn set_line_quantity(&self, cart_line_id: CartLineId, quantity: u32) -> Result<bool> {
        let result = sqlx::query("UPDATE cart_lines SET quantity = $2 WHERE cart_line_id = $1")
            .bind(cart_line_id.as_uuid())
            .bind(i64::from(quantity))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_line(&self, cart_line_id: CartLineId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE cart_line_id = $1")
            .bind(cart_line_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn commit_checkout(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, user_id, order_date, total_amount_cents,
                status, payment_method, payment_status,
                shipping_address, phone_number, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.order_id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.order_date)
        .bind(order.total_amount.cents())
        .bind(order.status.as_str())
        .bind(order.payment_method.as_str())
        .bind(order.payment_status.as_str())
        .bind(&order.shipping_address)
        .bind(&order.phone_number)
        .bind(&order.notes)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, book_id, quantity, price_at_purchase_cents, subtotal_cents
                )
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.order_id.as_uuid())
            .bind(item.book_id.as_uuid())
            .bind(i64::from(item.quantity))
            .bind(item.price_at_purchase.cents())
            .bind(item.subtotal.cents())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(order.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT order_id, user_id, order_date, total_amount_cents,
                   status, payment_method, payment_status,
                   shipping_address, phone_number, notes
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut order = Self::row_to_order_header(row)?;
        order.items = self.items_for_order(order_id).await?;
        Ok(Some(order))
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, user_id, order_date, total_amount_cents,
                   status, payment_method, payment_status,
                   shipping_address, phone_number, notes
            FROM orders
            WHERE user_id = $1
            ORDER BY order_date DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let mut order = Self::row_to_order_header(row)?;
            order.items = self.items_for_order(order.order_id).await?;
            orders.push(order);
        }
        Ok(orders)
    }

    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_payment_status(
        &self,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET payment_status = $2 WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .bind(payment_status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn transition_status(
        &self,
        order_id: OrderId,
        from: &[OrderStatus],
        to: OrderStatus,
    ) -> Result<bool> {
        let from: Vec<String> = from.iter().map(|status| status.as_str().to_string()).collect();

        let result = sqlx::query(
            "UPDATE orders SET status = $2 WHERE order_id = $1 AND status = ANY($3)",
        )
        .bind(order_id.as_uuid())
        .bind(to.as_str())
        .bind(&from)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
