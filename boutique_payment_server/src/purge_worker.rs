use boutique_payment_engine::{
    events::EventProducers,
    traits::EventRetention,
    ReconciliationApi,
    SqliteDatabase,
};
use log::*;
use tokio::task::JoinHandle;

/// Starts the ledger retention worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Terminal ledger rows only matter until the provider has stopped retrying (processed) or an operator has followed
/// up (errored); after that they are noise, so the worker deletes them on the retention policy's horizons, once an
/// hour, in bounded batches.
pub fn start_purge_worker(db: SqliteDatabase, retention: EventRetention) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(3600));
        let api = ReconciliationApi::new(db, EventProducers::default());
        info!("🕰️ Ledger retention worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running ledger retention job");
            match api.purge_stale_events(&retention).await {
                Ok(result) if result.total() > 0 => {
                    info!(
                        "🕰️ Ledger purge removed {} rows ({} processed, {} errored)",
                        result.total(),
                        result.processed_deleted,
                        result.errored_deleted
                    );
                },
                Ok(_) => trace!("🕰️ Ledger purge found nothing to remove"),
                Err(e) => error!("🕰️ Error running ledger retention job: {e}"),
            }
        }
    })
}
