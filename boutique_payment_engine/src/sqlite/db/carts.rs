use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::Cart;

pub async fn fetch_cart_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    let cart = sqlx::query_as("SELECT * FROM carts WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(cart)
}

/// Deletes the user's cart and its items. Returns `true` if a cart existed. The order of deletes matters only for
/// backends without cascading foreign keys; items go first.
pub async fn delete_cart_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let cart = match fetch_cart_for_user(user_id, &mut *conn).await? {
        Some(cart) => cart,
        None => return Ok(false),
    };
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(cart.id).execute(&mut *conn).await?;
    sqlx::query("DELETE FROM carts WHERE id = $1").bind(cart.id).execute(&mut *conn).await?;
    debug!("📝️ Cart #{} for user #{user_id} deleted", cart.id);
    Ok(true)
}
