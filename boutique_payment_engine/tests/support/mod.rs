//! Shared fixtures for the reconciliation integration tests. Each test gets its own throwaway SQLite database.
#![allow(dead_code)]

use boutique_payment_engine::{
    events::EventProducers,
    provider_events::{EventDetail, OrderEventMeta, PaymentEvent, SlotEventMeta},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    PaymentReconciliationDatabase,
    ReconciliationApi,
    SqliteDatabase,
};
use chrono::{Duration, Utc};
use log::error;
use sqlx::{migrate::MigrateDatabase, Row, Sqlite};

pub async fn setup() -> ReconciliationApi<SqliteDatabase> {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> ReconciliationApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    // a single pooled connection: concurrent flows serialise completely, so assertions never race the engine
    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database");
    ReconciliationApi::new(db, producers)
}

pub async fn tear_down(mut api: ReconciliationApi<SqliteDatabase>) {
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

//----------------------------------------   Seeding helpers   -------------------------------------------------------

pub async fn seed_product(db: &SqliteDatabase, id: i64, name: &str, stock: i64) {
    sqlx::query("INSERT INTO products (id, name, stock) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(stock)
        .execute(db.pool())
        .await
        .expect("Error seeding product");
}

pub async fn seed_order(db: &SqliteDatabase, id: i64, user_id: Option<i64>, total_cents: i64) {
    sqlx::query("INSERT INTO orders (id, user_id, total, delivery_mode) VALUES ($1, $2, $3, 'HOME')")
        .bind(id)
        .bind(user_id)
        .bind(total_cents)
        .execute(db.pool())
        .await
        .expect("Error seeding order");
}

pub async fn seed_order_item(db: &SqliteDatabase, order_id: i64, product_id: i64, quantity: i64, unit_price: i64) {
    sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)")
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .execute(db.pool())
        .await
        .expect("Error seeding order item");
}

pub async fn seed_cart(db: &SqliteDatabase, user_id: i64, product_id: i64) {
    let row = sqlx::query("INSERT INTO carts (user_id) VALUES ($1) RETURNING id")
        .bind(user_id)
        .fetch_one(db.pool())
        .await
        .expect("Error seeding cart");
    let cart_id: i64 = row.get(0);
    sqlx::query("INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, 1)")
        .bind(cart_id)
        .bind(product_id)
        .execute(db.pool())
        .await
        .expect("Error seeding cart item");
}

pub async fn seed_slot(db: &SqliteDatabase, id: i64, service_id: i64, status: &str) {
    let start = Utc::now() + Duration::days(3);
    let end = start + Duration::hours(1);
    sqlx::query("INSERT INTO slots (id, service_id, start_at, end_at, status) VALUES ($1, $2, $3, $4, $5)")
        .bind(id)
        .bind(service_id)
        .bind(start)
        .bind(end)
        .bind(status)
        .execute(db.pool())
        .await
        .expect("Error seeding slot");
}

pub async fn seed_booking(db: &SqliteDatabase, slot_id: i64, user_id: Option<i64>, email: &str) {
    sqlx::query(
        "INSERT INTO bookings (slot_id, user_id, first_name, last_name, email) VALUES ($1, $2, 'Awa', 'Diallo', $3)",
    )
    .bind(slot_id)
    .bind(user_id)
    .bind(email)
    .execute(db.pool())
    .await
    .expect("Error seeding booking");
}

//----------------------------------------   State inspectors   ------------------------------------------------------

pub async fn product_stock(db: &SqliteDatabase, id: i64) -> i64 {
    sqlx::query("SELECT stock FROM products WHERE id = $1")
        .bind(id)
        .fetch_one(db.pool())
        .await
        .expect("Error fetching stock")
        .get(0)
}

pub async fn order_status(db: &SqliteDatabase, id: i64) -> String {
    sqlx::query("SELECT status FROM orders WHERE id = $1")
        .bind(id)
        .fetch_one(db.pool())
        .await
        .expect("Error fetching order status")
        .get(0)
}

pub async fn slot_status(db: &SqliteDatabase, id: i64) -> String {
    sqlx::query("SELECT status FROM slots WHERE id = $1")
        .bind(id)
        .fetch_one(db.pool())
        .await
        .expect("Error fetching slot status")
        .get(0)
}

pub async fn cart_count_for_user(db: &SqliteDatabase, user_id: i64) -> i64 {
    sqlx::query("SELECT COUNT(*) FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db.pool())
        .await
        .expect("Error counting carts")
        .get(0)
}

pub async fn ledger_row(db: &SqliteDatabase, event_id: &str) -> Option<(String, Option<String>)> {
    sqlx::query("SELECT status, error FROM payment_events WHERE event_id = $1")
        .bind(event_id)
        .fetch_optional(db.pool())
        .await
        .expect("Error fetching ledger row")
        .map(|row| (row.get(0), row.get(1)))
}

/// Backdate a ledger row's `updated_at`, to simulate a claim left behind by a crashed worker.
pub async fn age_ledger_row(db: &SqliteDatabase, event_id: &str, seconds: i64) {
    sqlx::query(
        "UPDATE payment_events SET updated_at = datetime(updated_at, '-' || $2 || ' seconds'), created_at = \
         datetime(created_at, '-' || $2 || ' seconds') WHERE event_id = $1",
    )
    .bind(event_id)
    .bind(seconds)
    .execute(db.pool())
    .await
    .expect("Error aging ledger row");
}

//----------------------------------------   Event builders   --------------------------------------------------------

pub fn checkout_event(event_id: &str, order_id: i64, user_id: Option<i64>) -> PaymentEvent {
    let meta = OrderEventMeta {
        order_id: Some(order_id.to_string()),
        user_id: user_id.map(|id| id.to_string()),
        payment_intent_id: Some(format!("pi_{event_id}")),
    };
    PaymentEvent::new(event_id, EventDetail::CheckoutCompleted(meta))
}

pub fn payment_failed_event(event_id: &str, order_id: i64) -> PaymentEvent {
    PaymentEvent::new(event_id, EventDetail::PaymentFailed(OrderEventMeta::for_order(order_id)))
}

pub fn slot_checkout_event(event_id: &str, slot_id: i64) -> PaymentEvent {
    let meta = SlotEventMeta {
        slot_id: Some(slot_id.to_string()),
        user_id: None,
        payment_intent_id: Some(format!("pi_{event_id}")),
    };
    PaymentEvent::new(event_id, EventDetail::SlotCheckoutCompleted(meta))
}
