//! Boutique Payment Engine
//!
//! The reconciliation core of the boutique storefront. The payment provider delivers asynchronous, at-least-once,
//! possibly-duplicated notifications; this library turns them into exactly-once, durable state transitions (an order
//! becomes paid and its stock is decremented, a reservation slot becomes booked) without ever double-charging stock
//! or double-fulfilling an order, even under retries, concurrent deliveries or crashes mid-transaction.
//!
//! The library is divided into three main sections:
//! 1. Backend contracts and database management ([`mod@traits`], [`mod@sqlite`]). SQLite is the supported backend.
//!    You should never need to touch the database directly; use the public API instead. The exception is the data
//!    types, which are defined in [`mod@db_types`] and are public.
//! 2. The reconciliation public API ([`ReconciliationApi`]), which consumes verified provider events
//!    ([`mod@provider_events`]) and drives the ledger-claim → atomic-transition → ledger-commit flow.
//! 3. Events ([`mod@events`]): a small hook system for best-effort side effects. When an order is reconciled an
//!    `OrderPaidEvent` is emitted; subscribers (the notification dispatcher, typically) act on it outside the
//!    transaction.
mod bpe_api;

pub mod db_types;
pub mod events;
pub mod provider_events;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use bpe_api::{ReconciliationApi, ReconciliationError, ReconciliationOutcome, DEFAULT_STALE_EVENT_LEASE};
pub use traits::{
    LedgerManagement,
    OrderManagement,
    PaymentReconciliationDatabase,
    ReservationManagement,
};
