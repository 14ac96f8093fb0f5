//! End-to-end tests for the slot-reservation payment path.
use boutique_payment_engine::{
    db_types::SlotStatus,
    provider_events::{EventDetail, PaymentEvent, SlotEventMeta},
    ReconciliationOutcome,
    ReservationManagement,
};

mod support;
use support::*;

#[tokio::test]
async fn open_slot_is_booked_with_payment_reference() {
    let api = setup().await;
    let db = api.db().clone();
    seed_slot(&db, 9, 3, "Open").await;
    seed_booking(&db, 9, Some(21), "awa@example.com").await;

    let event = slot_checkout_event("evt_slot_9", 9);
    let outcome = api.process_reservation_event(&event).await.expect("Error processing event");

    assert!(matches!(outcome, ReconciliationOutcome::SlotBooked(_)));
    let slot = db.fetch_slot(9).await.expect("Error loading slot").expect("Slot missing");
    assert_eq!(slot.status, SlotStatus::Booked);
    assert_eq!(slot.payment_intent_id.as_deref(), Some("pi_evt_slot_9"));
    let booking = db.fetch_booking_for_slot(9).await.expect("Error loading booking").expect("Booking missing");
    assert_eq!(booking.email.as_deref(), Some("awa@example.com"));
    let (status, _) = ledger_row(&db, "evt_slot_9").await.expect("Ledger row missing");
    assert_eq!(status, "Processed");
    tear_down(api).await;
}

#[tokio::test]
async fn second_delivery_of_the_same_event_does_not_throw() {
    let api = setup().await;
    let db = api.db().clone();
    seed_slot(&db, 9, 3, "Open").await;

    let event = slot_checkout_event("evt_slot_9", 9);
    let first = api.process_reservation_event(&event).await.expect("Error processing event");
    assert!(matches!(first, ReconciliationOutcome::SlotBooked(_)));
    let second = api.process_reservation_event(&event).await.expect("Error processing replay");
    assert!(matches!(second, ReconciliationOutcome::AlreadyProcessed));
    assert_eq!(slot_status(&db, 9).await, "Booked");
    tear_down(api).await;
}

#[tokio::test]
async fn already_booked_slot_is_an_idempotent_no_op() {
    let api = setup().await;
    let db = api.db().clone();
    seed_slot(&db, 9, 3, "Booked").await;

    // A fresh event id for a slot someone already reconciled. Worse things than a double-ack exist; this must not be
    // an error.
    let event = slot_checkout_event("evt_slot_9_retry", 9);
    let outcome = api.process_reservation_event(&event).await.expect("Error processing event");

    assert!(matches!(outcome, ReconciliationOutcome::AlreadyReconciled));
    assert_eq!(slot_status(&db, 9).await, "Booked");
    let (status, _) = ledger_row(&db, "evt_slot_9_retry").await.expect("Ledger row missing");
    assert_eq!(status, "Processed");
    tear_down(api).await;
}

#[tokio::test]
async fn missing_slot_records_an_error_outcome() {
    let api = setup().await;
    let db = api.db().clone();
    let event = slot_checkout_event("evt_slot_ghost", 404);
    let outcome = api.process_reservation_event(&event).await.expect("Error processing event");
    assert!(matches!(outcome, ReconciliationOutcome::Failed(_)));
    let (status, error) = ledger_row(&db, "evt_slot_ghost").await.expect("Ledger row missing");
    assert_eq!(status, "Error");
    assert!(error.unwrap().contains("does not exist"));
    tear_down(api).await;
}

#[tokio::test]
async fn missing_slot_id_is_acknowledged_and_skipped() {
    let api = setup().await;
    let db = api.db().clone();
    let event = PaymentEvent::new("evt_no_slot", EventDetail::SlotCheckoutCompleted(SlotEventMeta::default()));
    let outcome = api.process_reservation_event(&event).await.expect("Error processing event");
    assert!(matches!(outcome, ReconciliationOutcome::Ignored(_)));
    assert!(ledger_row(&db, "evt_no_slot").await.is_none());
    tear_down(api).await;
}

#[tokio::test]
async fn order_events_are_ignored_on_the_reservation_path() {
    let api = setup().await;
    let event = checkout_event("evt_wrong_family", 42, None);
    let outcome = api.process_reservation_event(&event).await.expect("Error processing event");
    assert!(matches!(outcome, ReconciliationOutcome::Ignored(_)));
    tear_down(api).await;
}
