//! # Boutique payment engine public API
//!
//! The `bpe_api` module exposes the programmatic API of the reconciliation engine.
//!
//! * [`reconciliation_api`] is the primary API. It consumes verified, typed payment-provider events and orchestrates
//!   exactly-once state transitions against the order and reservation stores, using the event ledger for duplicate
//!   suppression.
//!
//! An API instance is created by supplying a database backend that implements
//! [`crate::traits::PaymentReconciliationDatabase`]:
//!
//! ```rust,ignore
//! use boutique_payment_engine::{events::EventProducers, ReconciliationApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(url, 25).await?;
//! let api = ReconciliationApi::new(db, EventProducers::default());
//! let outcome = api.process_order_event(&event).await?;
//! ```
pub mod errors;
pub mod reconciliation_api;

pub use errors::ReconciliationError;
pub use reconciliation_api::{ReconciliationApi, ReconciliationOutcome, DEFAULT_STALE_EVENT_LEASE};
