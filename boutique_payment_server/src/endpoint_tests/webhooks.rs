//! Endpoint tests for the webhook boundary: whatever happens inside, the provider sees 200 {"received":true}, and
//! the database ends up in the state the event dictates.
use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use boutique_payment_engine::{
    events::EventProducers,
    provider_events::{EventDetail, OrderEventMeta, PaymentEvent, SlotEventMeta},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    ReconciliationApi,
    SqliteDatabase,
};
use log::debug;
use sqlx::Row;

use crate::routes::{health, OrderWebhookRoute, ReservationWebhookRoute};

async fn setup_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn post_event(db: &SqliteDatabase, path: &str, event: &PaymentEvent) -> (StatusCode, String) {
    let api = ReconciliationApi::new(db.clone(), EventProducers::default());
    let app = App::new().app_data(web::Data::new(api)).service(health).service(
        web::scope("/webhooks")
            .service(OrderWebhookRoute::<SqliteDatabase>::new())
            .service(ReservationWebhookRoute::<SqliteDatabase>::new()),
    );
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri(path).set_json(event).to_request();
    debug!("Posting event to {path}");
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    (status, body)
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init();
    let service = test::init_service(App::new().service(health)).await;
    let res = test::call_service(&service, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn order_webhook_acks_and_fulfils() {
    let _ = env_logger::try_init();
    let db = setup_db().await;
    sqlx::query("INSERT INTO products (id, name, stock) VALUES (7, 'Shea butter 250ml', 5)")
        .execute(db.pool())
        .await
        .unwrap();
    sqlx::query("INSERT INTO orders (id, user_id, total) VALUES (42, 11, 4500)").execute(db.pool()).await.unwrap();
    sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES (42, 7, 3, 1500)")
        .execute(db.pool())
        .await
        .unwrap();

    let event = PaymentEvent::new(
        "evt_42_paid",
        EventDetail::CheckoutCompleted(OrderEventMeta {
            order_id: Some("42".into()),
            user_id: Some("11".into()),
            payment_intent_id: Some("pi_42".into()),
        }),
    );
    let (status, body) = post_event(&db, "/webhooks/order", &event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);

    let stock: i64 =
        sqlx::query("SELECT stock FROM products WHERE id = 7").fetch_one(db.pool()).await.unwrap().get(0);
    assert_eq!(stock, 2);
    let order_status: String =
        sqlx::query("SELECT status FROM orders WHERE id = 42").fetch_one(db.pool()).await.unwrap().get(0);
    assert_eq!(order_status, "Paid");
}

#[actix_web::test]
async fn order_webhook_acks_even_when_fulfilment_fails() {
    let _ = env_logger::try_init();
    let db = setup_db().await;
    sqlx::query("INSERT INTO products (id, name, stock) VALUES (7, 'Shea butter 250ml', 2)")
        .execute(db.pool())
        .await
        .unwrap();
    sqlx::query("INSERT INTO orders (id, user_id, total) VALUES (43, 12, 15000)").execute(db.pool()).await.unwrap();
    sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES (43, 7, 10, 1500)")
        .execute(db.pool())
        .await
        .unwrap();

    let event = PaymentEvent::new(
        "evt_43_paid",
        EventDetail::CheckoutCompleted(OrderEventMeta::for_order(43)),
    );
    let (status, body) = post_event(&db, "/webhooks/order", &event).await;
    // The boundary absorbs the business failure; only the ledger remembers it.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);

    let stock: i64 =
        sqlx::query("SELECT stock FROM products WHERE id = 7").fetch_one(db.pool()).await.unwrap().get(0);
    assert_eq!(stock, 2);
    let (ledger_status, error): (String, Option<String>) =
        sqlx::query("SELECT status, error FROM payment_events WHERE event_id = 'evt_43_paid'")
            .fetch_one(db.pool())
            .await
            .map(|row| (row.get(0), row.get(1)))
            .unwrap();
    assert_eq!(ledger_status, "Error");
    assert!(error.unwrap().contains("Insufficient stock"));
}

#[actix_web::test]
async fn reservation_webhook_books_the_slot() {
    let _ = env_logger::try_init();
    let db = setup_db().await;
    sqlx::query(
        "INSERT INTO slots (id, service_id, start_at, end_at, status) VALUES (9, 3, '2026-09-01 10:00:00', \
         '2026-09-01 11:00:00', 'Open')",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let event = PaymentEvent::new(
        "evt_slot_9",
        EventDetail::SlotCheckoutCompleted(SlotEventMeta {
            slot_id: Some("9".into()),
            user_id: None,
            payment_intent_id: Some("pi_slot_9".into()),
        }),
    );
    let (status, body) = post_event(&db, "/webhooks/reservation", &event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);

    let (slot_status, payment_ref): (String, Option<String>) =
        sqlx::query("SELECT status, payment_intent_id FROM slots WHERE id = 9")
            .fetch_one(db.pool())
            .await
            .map(|row| (row.get(0), row.get(1)))
            .unwrap();
    assert_eq!(slot_status, "Booked");
    assert_eq!(payment_ref.as_deref(), Some("pi_slot_9"));

    // replay the identical delivery: same ack, no change, no panic
    let (status, body) = post_event(&db, "/webhooks/reservation", &event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
}

#[actix_web::test]
async fn unhandled_event_types_are_still_acknowledged() {
    let _ = env_logger::try_init();
    let db = setup_db().await;
    let event: PaymentEvent =
        serde_json::from_str(r#"{ "eventId": "evt_odd", "eventType": "charge.refunded", "metadata": {} }"#).unwrap();
    let (status, body) = post_event(&db, "/webhooks/order", &event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
    let count: i64 = sqlx::query("SELECT COUNT(*) FROM payment_events").fetch_one(db.pool()).await.unwrap().get(0);
    assert_eq!(count, 0, "Unhandled events must not leave ledger rows");
}
