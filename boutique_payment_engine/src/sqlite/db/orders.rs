use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderItem, Product},
    traits::OrderStoreError,
};

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Line items ordered by insertion, so fulfilment walks them deterministically.
pub async fn fetch_items_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// Decrements the product's stock by `quantity`. The `stock >= quantity` guard means the statement cannot drive stock
/// negative even if the caller's earlier sufficiency check was raced; inside the fulfilment transaction that guard
/// failing aborts the whole order.
pub async fn decrement_stock(
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), OrderStoreError> {
    let result = sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        let available = fetch_product(product_id, conn).await?.map(|p| p.stock).unwrap_or(0);
        return Err(OrderStoreError::InsufficientStock { product_id, requested: quantity, available });
    }
    trace!("📝️ Product #{product_id} stock decremented by {quantity}");
    Ok(())
}

/// Marks a pending order as paid, attaching the payment reference if the order has none yet. The `status = 'Pending'`
/// guard keeps the transition single-shot: a second UPDATE for the same order matches nothing.
pub async fn mark_order_paid(
    order_id: i64,
    payment_ref: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = 'Paid', payment_intent_id = COALESCE(payment_intent_id, $2), updated_at = \
         CURRENT_TIMESTAMP WHERE id = $1 AND status = 'Pending' RETURNING *",
    )
    .bind(order_id)
    .bind(payment_ref)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
