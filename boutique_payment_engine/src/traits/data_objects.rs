use chrono::Duration;

use crate::db_types::{Booking, Order, OrderItem, Slot};

/// The result of a successful fulfilment transaction.
#[derive(Debug, Clone)]
pub struct FulfilledOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Whether the owning user's cart existed and was deleted inside the transaction.
    pub cart_deleted: bool,
}

/// The result of attempting the open→booked transition on a slot.
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    /// The slot was open and has been booked by this call.
    Booked { slot: Slot, booking: Option<Booking> },
    /// The slot was not open. The transition already happened (or the slot was withdrawn); nothing was mutated.
    AlreadyReconciled(Slot),
}

/// Retention policy for terminal ledger rows. Processed rows are routine and purged early; error rows are kept longer
/// for operator follow-up.
#[derive(Debug, Clone)]
pub struct EventRetention {
    pub processed_for: Duration,
    pub errored_for: Duration,
    /// Maximum rows deleted per statement, so the purge never holds a long write lock.
    pub batch_size: i64,
}

impl Default for EventRetention {
    fn default() -> Self {
        Self { processed_for: Duration::days(7), errored_for: Duration::days(30), batch_size: 1000 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeResult {
    pub processed_deleted: u64,
    pub errored_deleted: u64,
}

impl PurgeResult {
    pub fn total(&self) -> u64 {
        self.processed_deleted + self.errored_deleted
    }
}
