use thiserror::Error;

use crate::traits::LedgerError;

/// Infrastructure failures surfaced by the reconciliation flows. Business-rule failures never appear here; they are
/// absorbed into ledger `Error` outcomes and reported through
/// [`ReconciliationOutcome`](crate::ReconciliationOutcome).
#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Ledger failure. {0}")]
    Ledger(#[from] LedgerError),
    #[error("The order store is unavailable. {0}")]
    OrderStoreUnavailable(String),
    #[error("The reservation store is unavailable. {0}")]
    ReservationStoreUnavailable(String),
}
