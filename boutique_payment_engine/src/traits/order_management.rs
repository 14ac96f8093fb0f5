use thiserror::Error;

use crate::{
    db_types::{OrderStatusType, OrderWithItems},
    traits::FulfilledOrder,
};

/// The order-store primitives the reconciliation engine needs. Nothing here knows about payment providers; the store
/// only understands orders, line items, product stock and carts.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Load an order together with its line items.
    async fn fetch_order_with_items(&self, order_id: i64) -> Result<Option<OrderWithItems>, OrderStoreError>;

    /// The single atomic fulfilment transition for a pending order:
    /// * verify stock sufficiency for **all** line items before mutating **any** (all-or-nothing),
    /// * decrement each product's stock by the line quantity,
    /// * set the order status to `Paid` and attach the payment reference if one is supplied and none is set,
    /// * delete the owning user's cart and its items, when the order has an owning user.
    ///
    /// Everything happens in one transaction; on any error the store is left exactly as it was.
    async fn fulfil_order(&self, order_id: i64, payment_ref: Option<&str>) -> Result<FulfilledOrder, OrderStoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Internal order store database error: {0}")]
    DatabaseError(String),
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("Order #{order_id} is {status}, not Pending")]
    OrderNotPending { order_id: i64, status: OrderStatusType },
    #[error("Insufficient stock for product #{product_id}: need {requested}, have {available}")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
}

impl OrderStoreError {
    /// Business precondition failures are absorbed into ledger `Error` outcomes; database failures propagate.
    pub fn is_business_failure(&self) -> bool {
        !matches!(self, OrderStoreError::DatabaseError(_))
    }
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}
