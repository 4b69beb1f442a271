use common::UserId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Book, CartLine, Money};
use ordering::{CheckoutRequest, OrderAssembler};
use storage::{BookStore, CartStore, MemoryStore, UserDirectory, UserRecord};

async fn seeded_store(lines: u32) -> (MemoryStore, UserId) {
    let store = MemoryStore::new();
    let user = UserRecord {
        user_id: UserId::new(),
        email: "bench@example.com".to_string(),
        full_name: "Bench".to_string(),
    };
    store.insert_user(&user).await.unwrap();

    for n in 0..lines {
        let book = Book::new(format!("Book {n}"), Money::from_cents(1000), 1_000_000);
        store.insert_book(&book).await.unwrap();
        store
            .insert_line(&CartLine::new(user.user_id, book.book_id, 2).unwrap())
            .await
            .unwrap();
    }

    (store, user.user_id)
}

fn request(user_id: UserId) -> CheckoutRequest {
    CheckoutRequest {
        user_id,
        shipping_address: "1 Bench Lane".to_string(),
        phone_number: "0900000000".to_string(),
        payment_method: "COD".to_string(),
        notes: None,
    }
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    for lines in [1u32, 5, 20] {
        c.bench_function(&format!("ordering/place_order_{lines}_lines"), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let (store, user_id) = seeded_store(lines).await;
                    let assembler = OrderAssembler::new(store);
                    assembler.place_order(request(user_id)).await.unwrap();
                });
            });
        });
    }
}

fn bench_failed_checkout_rollback(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("ordering/checkout_rollback_5_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (store, user_id) = seeded_store(5).await;
                // Make the last line unfulfillable.
                let lines = store.lines_for_user(user_id).await.unwrap();
                let last = lines.last().unwrap();
                let mut book = store.book(last.book_id).await.unwrap().unwrap();
                book.stock_quantity = 0;
                store.insert_book(&book).await.unwrap();

                let assembler = OrderAssembler::new(store);
                assert!(assembler.place_order(request(user_id)).await.is_err());
            });
        });
    });
}

criterion_group!(benches, bench_place_order, bench_failed_checkout_rollback);
criterion_main!(benches);
