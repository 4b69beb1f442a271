//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p storage --test postgres_integration
//! ```

use std::sync::Arc;

use common::{BookId, UserId};
use domain::{Book, CartLine, Money, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, ShippingDetails};
use serial_test::serial;
use sqlx::PgPool;
use storage::{BookStore, CartStore, OrderStore, PostgresStore, ReserveOutcome, UserDirectory, UserRecord};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for the schema
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!("../../../migrations/001_create_tables.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE order_items, orders, cart_lines, books, users")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

async fn seed_user(store: &PostgresStore, email: &str) -> UserId {
    let user = UserRecord {
        user_id: UserId::new(),
        email: email.to_string(),
        full_name: "Integration Tester".to_string(),
    };
    store.insert_user(&user).await.unwrap();
    user.user_id
}

async fn seed_book(store: &PostgresStore, price_cents: i64, stock: i64) -> BookId {
    let book = Book::new("A Book", Money::from_cents(price_cents), stock);
    store.insert_book(&book).await.unwrap();
    book.book_id
}

fn order_for(user_id: UserId, book_id: BookId, quantity: u32, price_cents: i64) -> Order {
    let items = vec![OrderItem::new(book_id, quantity, Money::from_cents(price_cents)).unwrap()];
    Order::place(
        user_id,
        ShippingDetails {
            shipping_address: "7 Dong Khoi".to_string(),
            phone_number: "0933444555".to_string(),
            notes: Some("call first".to_string()),
        },
        PaymentMethod::Momo,
        items,
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn book_roundtrip() {
    let store = get_test_store().await;
    let book = Book::new("Roundtrip", Money::from_cents(1999), 7);
    store.insert_book(&book).await.unwrap();

    let loaded = store.book(book.book_id).await.unwrap().unwrap();
    assert_eq!(loaded, book);

    assert!(store.book(BookId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn user_existence() {
    let store = get_test_store().await;
    let user_id = seed_user(&store, "exists@example.com").await;

    assert!(store.user_exists(user_id).await.unwrap());
    assert!(!store.user_exists(UserId::new()).await.unwrap());
}

#[tokio::test]
#[serial]
async fn reserve_stock_conditionally_decrements() {
    let store = get_test_store().await;
    let book_id = seed_book(&store, 1000, 3).await;

    let outcome = store.reserve_stock(book_id, 2).await.unwrap();
    assert_eq!(outcome, ReserveOutcome::Reserved { remaining: 1 });

    let outcome = store.reserve_stock(book_id, 2).await.unwrap();
    assert_eq!(outcome, ReserveOutcome::Insufficient { available: 1 });

    // The refused attempt mutated nothing.
    let book = store.book(book_id).await.unwrap().unwrap();
    assert_eq!(book.stock_quantity, 1);

    let outcome = store.reserve_stock(BookId::new(), 1).await.unwrap();
    assert_eq!(outcome, ReserveOutcome::NotFound);
}

#[tokio::test]
#[serial]
async fn restore_stock_increments() {
    let store = get_test_store().await;
    let book_id = seed_book(&store, 1000, 1).await;

    assert_eq!(store.restore_stock(book_id, 4).await.unwrap(), Some(5));
    assert_eq!(store.restore_stock(BookId::new(), 1).await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn concurrent_reservations_on_one_row_never_oversell() {
    let store = get_test_store().await;
    let book_id = seed_book(&store, 1000, 2).await;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.reserve_stock(book_id, 1).await.unwrap() })
        })
        .collect();

    let outcomes = futures_util::future::join_all(tasks).await;
    let reserved = outcomes
        .iter()
        .filter(|outcome| matches!(outcome.as_ref().unwrap(), ReserveOutcome::Reserved { .. }))
        .count();

    assert_eq!(reserved, 2);
    let book = store.book(book_id).await.unwrap().unwrap();
    assert_eq!(book.stock_quantity, 0);
}

#[tokio::test]
#[serial]
async fn reservations_on_different_books_are_independent() {
    let store = get_test_store().await;
    let first = seed_book(&store, 1000, 1).await;
    let second = seed_book(&store, 1000, 1).await;

    let (a, b) = tokio::join!(store.reserve_stock(first, 1), store.reserve_stock(second, 1));
    assert_eq!(a.unwrap(), ReserveOutcome::Reserved { remaining: 0 });
    assert_eq!(b.unwrap(), ReserveOutcome::Reserved { remaining: 0 });
}

#[tokio::test]
#[serial]
async fn cart_lines_roundtrip_in_added_order() {
    let store = get_test_store().await;
    let user_id = seed_user(&store, "cart@example.com").await;
    let first_book = seed_book(&store, 1000, 5).await;
    let second_book = seed_book(&store, 2000, 5).await;

    let first = CartLine::new(user_id, first_book, 1).unwrap();
    let second = CartLine::new(user_id, second_book, 2).unwrap();
    store.insert_line(&first).await.unwrap();
    store.insert_line(&second).await.unwrap();

    let lines = store.lines_for_user(user_id).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].cart_line_id, first.cart_line_id);
    assert_eq!(lines[1].cart_line_id, second.cart_line_id);

    let by_book = store.line_for_book(user_id, second_book).await.unwrap().unwrap();
    assert_eq!(by_book.quantity, 2);

    assert!(store.set_line_quantity(first.cart_line_id, 4).await.unwrap());
    let updated = store.line(first.cart_line_id).await.unwrap().unwrap();
    assert_eq!(updated.quantity, 4);

    assert!(store.remove_line(first.cart_line_id).await.unwrap());
    assert!(!store.remove_line(first.cart_line_id).await.unwrap());
    assert_eq!(store.clear_cart(user_id).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn commit_checkout_persists_order_and_clears_cart() {
    let store = get_test_store().await;
    let user_id = seed_user(&store, "checkout@example.com").await;
    let book_id = seed_book(&store, 1500, 5).await;
    store
        .insert_line(&CartLine::new(user_id, book_id, 2).unwrap())
        .await
        .unwrap();

    let order = order_for(user_id, book_id, 2, 1500);
    store.commit_checkout(&order).await.unwrap();

    let loaded = store.order(order.order_id).await.unwrap().unwrap();
    assert_eq!(loaded.order_id, order.order_id);
    assert_eq!(loaded.total_amount, Money::from_cents(3000));
    assert_eq!(loaded.status, OrderStatus::Pending);
    assert_eq!(loaded.payment_method, PaymentMethod::Momo);
    assert_eq!(loaded.items.len(), 1);
    assert_eq!(loaded.items[0].subtotal, Money::from_cents(3000));
    assert_eq!(loaded.notes.as_deref(), Some("call first"));

    assert!(store.lines_for_user(user_id).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn status_updates_and_conditional_transition() {
    let store = get_test_store().await;
    let user_id = seed_user(&store, "status@example.com").await;
    let book_id = seed_book(&store, 1000, 5).await;
    let order = order_for(user_id, book_id, 1, 1000);
    store.commit_checkout(&order).await.unwrap();

    assert!(store.set_status(order.order_id, OrderStatus::Confirmed).await.unwrap());
    assert!(
        store
            .set_payment_status(order.order_id, PaymentStatus::Paid)
            .await
            .unwrap()
    );

    let won = store
        .transition_status(order.order_id, OrderStatus::CANCELLABLE, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert!(won);

    // Already cancelled: the guard refuses a second transition.
    let won_again = store
        .transition_status(order.order_id, OrderStatus::CANCELLABLE, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert!(!won_again);

    let loaded = store.order(order.order_id).await.unwrap().unwrap();
    assert_eq!(loaded.status, OrderStatus::Cancelled);
    assert_eq!(loaded.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
#[serial]
async fn orders_for_user_most_recent_first() {
    let store = get_test_store().await;
    let user_id = seed_user(&store, "history@example.com").await;
    let book_id = seed_book(&store, 1000, 10).await;

    let older = order_for(user_id, book_id, 1, 1000);
    store.commit_checkout(&older).await.unwrap();
    let newer = order_for(user_id, book_id, 1, 1000);
    store.commit_checkout(&newer).await.unwrap();

    let orders = store.orders_for_user(user_id).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders[0].order_date >= orders[1].order_date);

    assert!(store.orders_for_user(UserId::new()).await.unwrap().is_empty());
}
