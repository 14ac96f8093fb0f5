use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{ClaimResult, EventId, EventOutcome, LedgerStatus, PaymentEventRow},
    traits::{EventRetention, PurgeResult},
};

/// The durable record of every inbound payment-notification identifier and its processing outcome.
///
/// The ledger is what turns the provider's at-least-once delivery into exactly-once reconciliation: every worker must
/// [`claim_event`](Self::claim_event) before touching business state, and must
/// [`commit_event`](Self::commit_event) afterwards regardless of the outcome, so that any later delivery of the same
/// id either sees `Processed` (skip) or `Error` (safe to retry, the business mutation was rolled back).
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Attempt to claim the event id for processing.
    ///
    /// The claim must be atomic with respect to concurrent claims of the same id; exactly one caller receives
    /// [`ClaimResult::Claimed`]. Rows in `Error` status are re-claimable, as are `Processing` rows whose last update
    /// is older than `stale_after` (the lease that keeps a crashed worker from wedging an event id forever).
    async fn claim_event(
        &self,
        event_id: &EventId,
        event_type: &str,
        stale_after: Duration,
    ) -> Result<ClaimResult, LedgerError>;

    /// Transition the claimed row to its terminal state and stamp `processed_at`.
    ///
    /// Must be called on both the success and the failure path. Committing a row that is not in `Processing` status
    /// is an [`LedgerError::InvalidTransition`].
    async fn commit_event(&self, event_id: &EventId, outcome: EventOutcome) -> Result<PaymentEventRow, LedgerError>;

    /// Fetch the ledger row for the given event id, if any.
    async fn fetch_event(&self, event_id: &EventId) -> Result<Option<PaymentEventRow>, LedgerError>;

    /// Delete terminal rows older than the retention policy allows, in bounded batches.
    async fn purge_events(&self, retention: &EventRetention) -> Result<PurgeResult, LedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Internal ledger database error: {0}")]
    DatabaseError(String),
    #[error("No ledger row exists for event id {0}")]
    EventNotFound(EventId),
    #[error("Cannot commit event {event_id}: row is {found} rather than Processing")]
    InvalidTransition { event_id: EventId, found: LedgerStatus },
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
