//! # SQLite database methods
//!
//! This module contains the "low-level" SQLite interactions.
//!
//! All of these are plain functions (rather than stateful structs) that accept a `&mut SqliteConnection` argument.
//! Callers can obtain a connection from a pool, or open an atomic transaction as the need arises and pass
//! `&mut *tx` through without any other changes.
use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod carts;
pub mod ledger;
pub mod orders;
pub mod slots;

/// WAL keeps readers off the writers' backs, which matters once several webhook workers reconcile concurrently
/// against the same file.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
