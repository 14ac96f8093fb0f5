use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Booking, Slot};

pub async fn fetch_slot(slot_id: i64, conn: &mut SqliteConnection) -> Result<Option<Slot>, sqlx::Error> {
    let slot = sqlx::query_as("SELECT * FROM slots WHERE id = $1").bind(slot_id).fetch_optional(conn).await?;
    Ok(slot)
}

/// The open→booked transition. The `status = 'Open'` guard makes the statement the arbiter: of any number of
/// concurrent attempts, exactly one matches a row and the rest see nothing updated.
pub async fn book_slot(
    slot_id: i64,
    payment_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Slot>, sqlx::Error> {
    let slot = sqlx::query_as(
        "UPDATE slots SET status = 'Booked', payment_intent_id = COALESCE(payment_intent_id, $2), updated_at = \
         CURRENT_TIMESTAMP WHERE id = $1 AND status = 'Open' RETURNING *",
    )
    .bind(slot_id)
    .bind(payment_ref)
    .fetch_optional(&mut *conn)
    .await?;
    if slot.is_some() {
        trace!("📝️ Slot #{slot_id} booked with payment reference {payment_ref}");
    }
    Ok(slot)
}

pub async fn fetch_booking_for_slot(
    slot_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, sqlx::Error> {
    let booking =
        sqlx::query_as("SELECT * FROM bookings WHERE slot_id = $1").bind(slot_id).fetch_optional(conn).await?;
    Ok(booking)
}
