//! # Backend contracts for the reconciliation engine.
//!
//! This module defines the interfaces a database backend must expose to support payment-event reconciliation.
//!
//! * [`LedgerManagement`] is the durable idempotency ledger: one row per provider event id, claimed before any
//!   business logic runs and finalised exactly once.
//! * [`OrderManagement`] exposes the two order-store primitives the engine needs: loading an order with its items and
//!   the single atomic decrement-stock-and-mark-paid transition.
//! * [`ReservationManagement`] exposes the slot-store primitives: loading a slot, the atomic open→booked transition,
//!   and the booking contact used to address confirmations.
//! * [`PaymentReconciliationDatabase`] ties the three together; it is the bound the reconciliation flows are generic
//!   over.
//!
//! None of these traits knows anything about the payment provider. Provider events are translated into primitive
//! calls by the [`crate::ReconciliationApi`].
mod data_objects;
mod ledger_management;
mod order_management;
mod reconciliation_database;
mod reservation_management;

pub use data_objects::{BookingOutcome, EventRetention, FulfilledOrder, PurgeResult};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use order_management::{OrderManagement, OrderStoreError};
pub use reconciliation_database::PaymentReconciliationDatabase;
pub use reservation_management::{ReservationManagement, ReservationStoreError};
