//! `SqliteDatabase` is the concrete SQLite backend for the reconciliation engine.
//!
//! It implements the ledger and both store contracts from the [`traits`](crate::traits) module. All multi-statement
//! mutations run inside a single `sqlx` transaction, so a failure at any point leaves the store exactly as it was.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;

use super::db::{carts, ledger, new_pool, orders, slots};
use crate::{
    db_types::{Booking, ClaimResult, EventId, EventOutcome, OrderWithItems, PaymentEventRow, Slot},
    traits::{
        BookingOutcome,
        EventRetention,
        FulfilledOrder,
        LedgerError,
        LedgerManagement,
        OrderManagement,
        OrderStoreError,
        PaymentReconciliationDatabase,
        PurgeResult,
        ReservationManagement,
        ReservationStoreError,
    },
};
use crate::db_types::{LedgerStatus, OrderStatusType, SlotStatus};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the embedded schema migrations. Safe to call on every startup; already-applied migrations are skipped.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await
    }
}

impl LedgerManagement for SqliteDatabase {
    /// The first-sighting insert and the guarded claim UPDATE run in one transaction so a concurrent claimer can
    /// never observe the row between the two statements.
    async fn claim_event(
        &self,
        event_id: &EventId,
        event_type: &str,
        stale_after: Duration,
    ) -> Result<ClaimResult, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let result = ledger::claim(event_id, event_type, stale_after, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Claim for event [{event_id}] resolved as {result:?}");
        Ok(result)
    }

    async fn commit_event(&self, event_id: &EventId, outcome: EventOutcome) -> Result<PaymentEventRow, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::commit(event_id, outcome, &mut conn).await
    }

    async fn fetch_event(&self, event_id: &EventId) -> Result<Option<PaymentEventRow>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_event(event_id, &mut conn).await
    }

    async fn purge_events(&self, retention: &EventRetention) -> Result<PurgeResult, LedgerError> {
        let mut result = PurgeResult::default();
        let mut conn = self.pool.acquire().await?;
        loop {
            let deleted =
                ledger::purge_batch(LedgerStatus::Processed, retention.processed_for, retention.batch_size, &mut conn)
                    .await?;
            result.processed_deleted += deleted;
            if deleted < retention.batch_size as u64 {
                break;
            }
        }
        loop {
            let deleted =
                ledger::purge_batch(LedgerStatus::Error, retention.errored_for, retention.batch_size, &mut conn)
                    .await?;
            result.errored_deleted += deleted;
            if deleted < retention.batch_size as u64 {
                break;
            }
        }
        if result.total() > 0 {
            debug!(
                "🗃️ Ledger purge deleted {} processed and {} errored rows",
                result.processed_deleted, result.errored_deleted
            );
        }
        Ok(result)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_with_items(&self, order_id: i64) -> Result<Option<OrderWithItems>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = match orders::fetch_order(order_id, &mut conn).await? {
            Some(order) => order,
            None => return Ok(None),
        };
        let items = orders::fetch_items_for_order(order_id, &mut conn).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    /// The fulfilment transaction. Loads the order and its items, verifies stock sufficiency for every line before
    /// mutating anything, then decrements stock, flips the order to `Paid` and deletes the owning user's cart. Any
    /// error rolls the whole transaction back.
    async fn fulfil_order(&self, order_id: i64, payment_ref: Option<&str>) -> Result<FulfilledOrder, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order(order_id, &mut tx).await?.ok_or(OrderStoreError::OrderNotFound(order_id))?;
        if order.status != OrderStatusType::Pending {
            return Err(OrderStoreError::OrderNotPending { order_id, status: order.status });
        }
        let items = orders::fetch_items_for_order(order_id, &mut tx).await?;
        // All-or-nothing: check every line before touching any stock row, so a shortfall on the last line cannot
        // leave the first lines decremented.
        for item in &items {
            let product = orders::fetch_product(item.product_id, &mut tx)
                .await?
                .ok_or(OrderStoreError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: 0,
                })?;
            if product.stock < item.quantity {
                return Err(OrderStoreError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: product.stock,
                });
            }
        }
        for item in &items {
            orders::decrement_stock(item.product_id, item.quantity, &mut tx).await?;
        }
        let order = orders::mark_order_paid(order_id, payment_ref, &mut tx)
            .await?
            .ok_or(OrderStoreError::OrderNotPending { order_id, status: OrderStatusType::Paid })?;
        let cart_deleted = match order.user_id {
            Some(user_id) => carts::delete_cart_for_user(user_id, &mut tx).await?,
            None => false,
        };
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} fulfilled: {} lines, cart_deleted={cart_deleted}", items.len());
        Ok(FulfilledOrder { order, items, cart_deleted })
    }
}

impl ReservationManagement for SqliteDatabase {
    async fn fetch_slot(&self, slot_id: i64) -> Result<Option<Slot>, ReservationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let slot = slots::fetch_slot(slot_id, &mut conn).await?;
        Ok(slot)
    }

    async fn book_slot(&self, slot_id: i64, payment_ref: &str) -> Result<BookingOutcome, ReservationStoreError> {
        let mut tx = self.pool.begin().await?;
        let outcome = match slots::book_slot(slot_id, payment_ref, &mut tx).await? {
            Some(slot) => {
                let booking = slots::fetch_booking_for_slot(slot_id, &mut tx).await?;
                BookingOutcome::Booked { slot, booking }
            },
            None => {
                let slot = slots::fetch_slot(slot_id, &mut tx)
                    .await?
                    .ok_or(ReservationStoreError::SlotNotFound(slot_id))?;
                // The guard only skips rows that are not Open; whatever state the slot is in now, the transition
                // already happened or is not ours to make.
                debug_assert!(slot.status != SlotStatus::Open);
                BookingOutcome::AlreadyReconciled(slot)
            },
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn fetch_booking_for_slot(&self, slot_id: i64) -> Result<Option<Booking>, ReservationStoreError> {
        let mut conn = self.pool.acquire().await?;
        let booking = slots::fetch_booking_for_slot(slot_id, &mut conn).await?;
        Ok(booking)
    }
}

impl PaymentReconciliationDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}
