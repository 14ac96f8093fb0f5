use chrono::Duration;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{ClaimResult, EventId, EventOutcome, LedgerStatus, PaymentEventRow},
    traits::LedgerError,
};

/// Registers intent to process the given event id and tries to take the claim, in two steps that the caller should
/// wrap in a transaction:
/// 1. an idempotent insert of the `Received` row (the unique constraint on `event_id` makes first-sighting atomic),
/// 2. a guarded UPDATE to `Processing` that only matches rows that are legitimately claimable: freshly `Received`,
///    previously `Error` (the business mutation was rolled back), or `Processing` but older than the staleness lease.
///
/// Exactly one of any number of concurrent callers gets `Claimed`; SQLite serialises the writes and the guard in the
/// UPDATE does the rest.
pub async fn claim(
    event_id: &EventId,
    event_type: &str,
    stale_after: Duration,
    conn: &mut SqliteConnection,
) -> Result<ClaimResult, LedgerError> {
    sqlx::query("INSERT INTO payment_events (event_id, event_type) VALUES ($1, $2) ON CONFLICT (event_id) DO NOTHING")
        .bind(event_id)
        .bind(event_type)
        .execute(&mut *conn)
        .await?;
    let claimed: Option<PaymentEventRow> = sqlx::query_as(
        format!(
            "UPDATE payment_events SET status = 'Processing', updated_at = CURRENT_TIMESTAMP WHERE event_id = $1 AND \
             (status IN ('Received', 'Error') OR (status = 'Processing' AND (unixepoch(CURRENT_TIMESTAMP) - \
             unixepoch(updated_at)) > {})) RETURNING *",
            stale_after.num_seconds()
        )
        .as_str(),
    )
    .bind(event_id)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(row) = claimed {
        trace!("🧾️ Event [{event_id}] claimed (ledger row {})", row.id);
        return Ok(ClaimResult::Claimed);
    }
    match fetch_event(event_id, conn).await? {
        Some(row) if row.status == LedgerStatus::Processed => Ok(ClaimResult::AlreadyProcessed),
        Some(_) => Ok(ClaimResult::AlreadyInFlight),
        // The row vanished between the insert and the select. Only a concurrent purge can do that; treat it as in
        // flight and let the provider redeliver.
        None => Ok(ClaimResult::AlreadyInFlight),
    }
}

/// Moves a `Processing` row to its terminal state and stamps `processed_at`. Committing a row in any other state is
/// refused so the Received→Processing→{Processed|Error} lifecycle cannot be bypassed.
pub async fn commit(
    event_id: &EventId,
    outcome: EventOutcome,
    conn: &mut SqliteConnection,
) -> Result<PaymentEventRow, LedgerError> {
    let (status, error) = match outcome {
        EventOutcome::Processed => (LedgerStatus::Processed, None),
        EventOutcome::Error(msg) => (LedgerStatus::Error, Some(msg)),
    };
    let row: Option<PaymentEventRow> = sqlx::query_as(
        "UPDATE payment_events SET status = $2, error = $3, processed_at = CURRENT_TIMESTAMP, updated_at = \
         CURRENT_TIMESTAMP WHERE event_id = $1 AND status = 'Processing' RETURNING *",
    )
    .bind(event_id)
    .bind(status)
    .bind(error)
    .fetch_optional(&mut *conn)
    .await?;
    match row {
        Some(row) => {
            debug!("🧾️ Event [{event_id}] committed as {}", row.status);
            Ok(row)
        },
        None => match fetch_event(event_id, conn).await? {
            Some(row) => Err(LedgerError::InvalidTransition { event_id: event_id.clone(), found: row.status }),
            None => Err(LedgerError::EventNotFound(event_id.clone())),
        },
    }
}

pub async fn fetch_event(
    event_id: &EventId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentEventRow>, LedgerError> {
    let row = sqlx::query_as("SELECT * FROM payment_events WHERE event_id = $1")
        .bind(event_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Deletes one batch of terminal rows in the given status older than `older_than`. Returns the number of rows
/// deleted; callers loop until a batch comes back smaller than `batch_size`.
pub async fn purge_batch(
    status: LedgerStatus,
    older_than: Duration,
    batch_size: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, LedgerError> {
    let result = sqlx::query(
        format!(
            "DELETE FROM payment_events WHERE id IN (SELECT id FROM payment_events WHERE status = $1 AND \
             (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) >= {} LIMIT {batch_size})",
            older_than.num_seconds()
        )
        .as_str(),
    )
    .bind(status)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
