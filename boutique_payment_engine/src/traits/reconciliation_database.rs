use crate::traits::{LedgerError, LedgerManagement, OrderManagement, ReservationManagement};

/// The highest-level contract a backend must satisfy to drive the reconciliation flows: the idempotency ledger plus
/// the two stores, behind one cloneable handle.
#[allow(async_fn_in_trait)]
pub trait PaymentReconciliationDatabase: Clone + LedgerManagement + OrderManagement + ReservationManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}
