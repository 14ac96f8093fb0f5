use thiserror::Error;

use crate::{
    db_types::{Booking, Slot},
    traits::BookingOutcome,
};

/// The reservation-store primitives. Independent of the order store; a deployment could back slots with a different
/// database entirely.
#[allow(async_fn_in_trait)]
pub trait ReservationManagement {
    /// Load a slot by id.
    async fn fetch_slot(&self, slot_id: i64) -> Result<Option<Slot>, ReservationStoreError>;

    /// The atomic open→booked transition. Attaches the payment reference when the slot has none yet. A slot that is
    /// not `Open` is reported as [`BookingOutcome::AlreadyReconciled`] and left untouched.
    async fn book_slot(&self, slot_id: i64, payment_ref: &str) -> Result<BookingOutcome, ReservationStoreError>;

    /// The contact record attached to a slot's reservation, if the reservation flow recorded one. Read-only here.
    async fn fetch_booking_for_slot(&self, slot_id: i64) -> Result<Option<Booking>, ReservationStoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum ReservationStoreError {
    #[error("Internal reservation store database error: {0}")]
    DatabaseError(String),
    #[error("Slot #{0} does not exist")]
    SlotNotFound(i64),
}

impl ReservationStoreError {
    pub fn is_business_failure(&self) -> bool {
        !matches!(self, ReservationStoreError::DatabaseError(_))
    }
}

impl From<sqlx::Error> for ReservationStoreError {
    fn from(e: sqlx::Error) -> Self {
        ReservationStoreError::DatabaseError(e.to_string())
    }
}
