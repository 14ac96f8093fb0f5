//! # Boutique payment server
//! This crate hosts the webhook boundary for the reconciliation engine. It is responsible for:
//! * Listening for incoming, signature-verified payment notifications from the provider.
//! * Handing each typed event to the reconciliation engine, one idempotent entry point per event family.
//! * Acknowledging every delivery with a 200 so the provider stops retrying; outcomes live in the ledger, not in the
//!   HTTP response.
//! * Running the ledger retention worker and dispatching best-effort notifications.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhooks/order`: order-payment events (`checkout_completed`, `payment_failed`).
//! * `/webhooks/reservation`: slot-reservation events (`slot_checkout_completed`).
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod notifications;
pub mod purge_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
