use std::fmt::{Debug, Display};

use chrono::Duration;
use log::*;

use crate::{
    db_types::{ClaimResult, EventId, EventOutcome, Order, Slot},
    events::{EventProducers, OrderPaidEvent, SlotBookedEvent},
    provider_events::{EventDetail, OrderEventMeta, PaymentEvent, SlotEventMeta},
    traits::{
        BookingOutcome,
        EventRetention,
        FulfilledOrder,
        PaymentReconciliationDatabase,
        PurgeResult,
    },
    ReconciliationError,
};

/// How long a `Processing` ledger row is honoured before a new delivery may take the claim over. Long enough for any
/// healthy fulfilment transaction, short enough that a crashed worker does not wedge an event id for the day.
pub const DEFAULT_STALE_EVENT_LEASE: Duration = Duration::minutes(5);

/// `ReconciliationApi` is the primary API for converting verified payment-provider events into exactly-once state
/// transitions: order fulfilment (stock decrement, pending→paid, cart deletion) and slot booking (open→booked).
///
/// Every flow follows the same discipline: resolve the target entity from the event metadata, claim the event id in
/// the ledger, run one atomic business transaction, commit the outcome to the ledger, and only then fire best-effort
/// side effects. Duplicate and concurrent deliveries short-circuit at the claim.
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
    stale_event_lease: Duration,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, stale_event_lease: DEFAULT_STALE_EVENT_LEASE }
    }

    /// Override the staleness lease on `Processing` ledger rows.
    pub fn with_stale_event_lease(mut self, lease: Duration) -> Self {
        self.stale_event_lease = lease;
        self
    }
}

/// The result of feeding one event through a reconciliation flow. Everything except an `Err` from the flow itself is
/// an acknowledgeable outcome; the webhook boundary logs it and tells the provider to stop retrying.
#[derive(Debug, Clone)]
pub enum ReconciliationOutcome {
    /// The order was fulfilled by this delivery: stock decremented, status paid, cart cleared.
    OrderPaid(Order),
    /// The slot was booked by this delivery.
    SlotBooked(Slot),
    /// The ledger already holds a `Processed` row for this event id. Nothing was done.
    AlreadyProcessed,
    /// Another worker currently holds the claim for this event id. Nothing was done.
    AlreadyInFlight,
    /// The target entity had already left its reconcilable state (e.g. a slot no longer `Open`). Recorded as
    /// processed; nothing was mutated.
    AlreadyReconciled,
    /// A `payment_failed` notification was recorded in the ledger. No business state changes on failure.
    FailureNoted,
    /// The event is not actionable (unknown type, missing or garbage metadata). Acknowledged and skipped without a
    /// ledger row.
    Ignored(String),
    /// A business precondition failed. The failure is recorded in the ledger as an `Error` outcome and the target
    /// entity is untouched; an operator has to follow up.
    Failed(String),
}

impl Display for ReconciliationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrderPaid(order) => write!(f, "order #{} marked as paid", order.id),
            Self::SlotBooked(slot) => write!(f, "slot #{} booked", slot.id),
            Self::AlreadyProcessed => write!(f, "duplicate delivery of a processed event"),
            Self::AlreadyInFlight => write!(f, "event is being processed by another worker"),
            Self::AlreadyReconciled => write!(f, "entity was already reconciled"),
            Self::FailureNoted => write!(f, "payment failure recorded"),
            Self::Ignored(reason) => write!(f, "event ignored: {reason}"),
            Self::Failed(reason) => write!(f, "reconciliation failed: {reason}"),
        }
    }
}

impl<B> ReconciliationApi<B>
where B: PaymentReconciliationDatabase
{
    /// Entry point for the order-payment event family.
    ///
    /// `checkout_completed` drives the pending→paid fulfilment flow. `payment_failed` is recorded in the ledger and
    /// changes nothing. Any other event type is acknowledged and ignored.
    pub async fn process_order_event(
        &self,
        event: &PaymentEvent,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        match &event.detail {
            EventDetail::CheckoutCompleted(meta) => self.reconcile_checkout(&event.event_id, meta).await,
            EventDetail::PaymentFailed(meta) => self.note_failed_payment(&event.event_id, meta).await,
            _ => {
                debug!("🔄️📦️ Ignoring '{}' event [{}] on the order path", event.event_type(), event.event_id);
                Ok(ReconciliationOutcome::Ignored(format!(
                    "'{}' events are not handled on the order path",
                    event.event_type()
                )))
            },
        }
    }

    /// Entry point for the slot-reservation event family.
    pub async fn process_reservation_event(
        &self,
        event: &PaymentEvent,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        match &event.detail {
            EventDetail::SlotCheckoutCompleted(meta) => self.reconcile_slot_checkout(&event.event_id, meta).await,
            _ => {
                debug!("🔄️📅️ Ignoring '{}' event [{}] on the reservation path", event.event_type(), event.event_id);
                Ok(ReconciliationOutcome::Ignored(format!(
                    "'{}' events are not handled on the reservation path",
                    event.event_type()
                )))
            },
        }
    }

    /// Passthrough for the ledger retention purge, so background workers only need an API handle.
    pub async fn purge_stale_events(&self, retention: &EventRetention) -> Result<PurgeResult, ReconciliationError> {
        Ok(self.db.purge_events(retention).await?)
    }

    async fn reconcile_checkout(
        &self,
        event_id: &EventId,
        meta: &OrderEventMeta,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        let Some(order_id) = meta.order_id() else {
            warn!("🔄️📦️ Event [{event_id}] carries no usable order id. Acknowledging without processing.");
            return Ok(ReconciliationOutcome::Ignored("missing or malformed order id in event metadata".into()));
        };
        match self.db.claim_event(event_id, crate::provider_events::CHECKOUT_COMPLETED, self.stale_event_lease).await?
        {
            ClaimResult::AlreadyProcessed => {
                debug!("🔄️📦️ Event [{event_id}] has already been processed. Skipping.");
                return Ok(ReconciliationOutcome::AlreadyProcessed);
            },
            ClaimResult::AlreadyInFlight => {
                debug!("🔄️📦️ Event [{event_id}] is already being processed. Skipping.");
                return Ok(ReconciliationOutcome::AlreadyInFlight);
            },
            ClaimResult::Claimed => {},
        }
        trace!("🔄️📦️ Event [{event_id}] claimed. Fulfilling order #{order_id}");
        match self.db.fulfil_order(order_id, meta.payment_intent_id.as_deref()).await {
            Ok(fulfilled) => {
                self.db.commit_event(event_id, EventOutcome::Processed).await?;
                info!(
                    "🔄️📦️ Order #{order_id} reconciled as paid by event [{event_id}]. {} line items, total {}.",
                    fulfilled.items.len(),
                    fulfilled.order.total
                );
                self.call_order_paid_hook(&fulfilled).await;
                Ok(ReconciliationOutcome::OrderPaid(fulfilled.order))
            },
            Err(e) if e.is_business_failure() => {
                let reason = e.to_string();
                warn!("🔄️📦️ Could not fulfil order #{order_id} for event [{event_id}]. {reason}");
                self.db.commit_event(event_id, EventOutcome::Error(reason.clone())).await?;
                Ok(ReconciliationOutcome::Failed(reason))
            },
            Err(e) => {
                // The store is unavailable. Record the failure if the ledger will still take it; if that also fails,
                // the row stays Processing and the staleness lease makes the event retryable.
                let reason = e.to_string();
                error!("🔄️📦️ Order store failure while fulfilling order #{order_id} for event [{event_id}]. {reason}");
                self.db.commit_event(event_id, EventOutcome::Error(reason.clone())).await?;
                Err(ReconciliationError::OrderStoreUnavailable(reason))
            },
        }
    }

    async fn note_failed_payment(
        &self,
        event_id: &EventId,
        meta: &OrderEventMeta,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        match self.db.claim_event(event_id, crate::provider_events::PAYMENT_FAILED, self.stale_event_lease).await? {
            ClaimResult::AlreadyProcessed => return Ok(ReconciliationOutcome::AlreadyProcessed),
            ClaimResult::AlreadyInFlight => return Ok(ReconciliationOutcome::AlreadyInFlight),
            ClaimResult::Claimed => {},
        }
        match meta.order_id() {
            Some(order_id) => {
                info!("🔄️📦️ Payment failed for order #{order_id} (event [{event_id}]). No state change.")
            },
            None => info!("🔄️📦️ Payment failed event [{event_id}] with no order reference. No state change."),
        }
        self.db.commit_event(event_id, EventOutcome::Processed).await?;
        Ok(ReconciliationOutcome::FailureNoted)
    }

    async fn reconcile_slot_checkout(
        &self,
        event_id: &EventId,
        meta: &SlotEventMeta,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        let Some(slot_id) = meta.slot_id() else {
            warn!("🔄️📅️ Event [{event_id}] carries no usable slot id. Acknowledging without processing.");
            return Ok(ReconciliationOutcome::Ignored("missing or malformed slot id in event metadata".into()));
        };
        match self
            .db
            .claim_event(event_id, crate::provider_events::SLOT_CHECKOUT_COMPLETED, self.stale_event_lease)
            .await?
        {
            ClaimResult::AlreadyProcessed => {
                debug!("🔄️📅️ Event [{event_id}] has already been processed. Skipping.");
                return Ok(ReconciliationOutcome::AlreadyProcessed);
            },
            ClaimResult::AlreadyInFlight => {
                debug!("🔄️📅️ Event [{event_id}] is already being processed. Skipping.");
                return Ok(ReconciliationOutcome::AlreadyInFlight);
            },
            ClaimResult::Claimed => {},
        }
        // The provider's payment reference is the natural value to pin to the slot; when the event carries none, the
        // event id still gives operators something to trace the deposit by.
        let payment_ref = meta.payment_intent_id.as_deref().unwrap_or(event_id.as_str());
        match self.db.book_slot(slot_id, payment_ref).await {
            Ok(BookingOutcome::Booked { slot, booking }) => {
                self.db.commit_event(event_id, EventOutcome::Processed).await?;
                info!("🔄️📅️ Slot #{slot_id} booked by event [{event_id}].");
                self.call_slot_booked_hook(slot.clone(), booking).await;
                Ok(ReconciliationOutcome::SlotBooked(slot))
            },
            Ok(BookingOutcome::AlreadyReconciled(slot)) => {
                // A slot stuck at Open after a successful booking would be far worse than a harmless double-ack, so
                // any non-open slot counts as reconciled.
                debug!(
                    "🔄️📅️ Slot #{slot_id} is already {}; treating event [{event_id}] as reconciled.",
                    slot.status
                );
                self.db.commit_event(event_id, EventOutcome::Processed).await?;
                Ok(ReconciliationOutcome::AlreadyReconciled)
            },
            Err(e) if e.is_business_failure() => {
                let reason = e.to_string();
                warn!("🔄️📅️ Could not book slot #{slot_id} for event [{event_id}]. {reason}");
                self.db.commit_event(event_id, EventOutcome::Error(reason.clone())).await?;
                Ok(ReconciliationOutcome::Failed(reason))
            },
            Err(e) => {
                let reason = e.to_string();
                error!("🔄️📅️ Reservation store failure while booking slot #{slot_id} for event [{event_id}]. {reason}");
                self.db.commit_event(event_id, EventOutcome::Error(reason.clone())).await?;
                Err(ReconciliationError::ReservationStoreUnavailable(reason))
            },
        }
    }

    async fn call_order_paid_hook(&self, fulfilled: &FulfilledOrder) {
        for producer in &self.producers.order_paid_producers {
            debug!("🔄️📦️ Notifying order paid subscribers");
            let event = OrderPaidEvent { order: fulfilled.order.clone(), items: fulfilled.items.clone() };
            producer.publish_event(event).await;
        }
    }

    async fn call_slot_booked_hook(&self, slot: Slot, booking: Option<crate::db_types::Booking>) {
        for producer in &self.producers.slot_booked_producers {
            debug!("🔄️📅️ Notifying slot booked subscribers");
            let event = SlotBookedEvent { slot: slot.clone(), booking: booking.clone() };
            producer.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
