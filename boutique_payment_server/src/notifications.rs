//! Best-effort notification dispatch.
//!
//! Notification delivery is an external collaborator: the engine emits an event once a transition has committed, and
//! a [`NotificationSink`] turns it into mail (or whatever the deployment wires up). A failed or slow sink can never
//! roll back the payment state; the hooks run on their own channel, off the transaction and off the request path.
use std::sync::Arc;

use boutique_payment_engine::events::{EventHooks, OrderPaidEvent, SlotBookedEvent};
use log::*;

pub trait NotificationSink: Send + Sync + 'static {
    fn order_paid(&self, event: &OrderPaidEvent);
    fn booking_confirmed(&self, event: &SlotBookedEvent);
}

/// Builds the engine hooks that feed a sink. Exactly one dispatch attempt per reconciled event; failures are the
/// sink's to log, never to propagate.
pub fn notification_hooks(sink: Arc<dyn NotificationSink>) -> EventHooks {
    let mut hooks = EventHooks::default();
    let order_sink = Arc::clone(&sink);
    hooks.on_order_paid(move |event| {
        let sink = Arc::clone(&order_sink);
        Box::pin(async move {
            sink.order_paid(&event);
        })
    });
    hooks.on_slot_booked(move |event| {
        let sink = Arc::clone(&sink);
        Box::pin(async move {
            sink.booking_confirmed(&event);
        })
    });
    hooks
}

/// The default sink: structured log lines only. Deployments that want real mail implement [`NotificationSink`] over
/// their mailer and wire it in [`crate::server::run_server`].
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn order_paid(&self, event: &OrderPaidEvent) {
        let order = &event.order;
        let eta = estimate_days(order.delivery_mode.as_deref());
        match order.user_id {
            Some(user_id) => info!(
                "📧️ Order-paid notification: order #{} for user #{user_id}, {} items, total {}, ETA {eta} days",
                order.id,
                event.items.len(),
                order.total
            ),
            None => info!(
                "📧️ Order-paid notification: guest order #{}, {} items, total {}, ETA {eta} days",
                order.id,
                event.items.len(),
                order.total
            ),
        }
    }

    fn booking_confirmed(&self, event: &SlotBookedEvent) {
        let slot = &event.slot;
        match &event.booking {
            Some(booking) => info!(
                "📧️ Booking-confirmed notification: slot #{} ({} → {}) for {} <{}>",
                slot.id,
                slot.start_at,
                slot.end_at,
                booking.display_name(),
                booking.email.as_deref().unwrap_or("no email on file")
            ),
            None => warn!(
                "📧️ Slot #{} booked but no booking contact is on file; nobody to notify.",
                slot.id
            ),
        }
    }
}

/// Delivery estimate in days, by delivery mode. Express couriers quote two days; everything else is the standard
/// four.
fn estimate_days(mode: Option<&str>) -> i64 {
    match mode {
        Some("EXPRESS") => 2,
        _ => 4,
    }
}
