use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use boutique_payment_engine::{
    events::{EventHandlers, EventProducers},
    ReconciliationApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    notifications::{notification_hooks, LogNotifier},
    purge_worker::start_purge_worker,
    routes::{health, OrderWebhookRoute, ReservationWebhookRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(128, notification_hooks(Arc::new(LogNotifier)));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    if config.disable_event_purge {
        warn!("🕰️ Ledger retention worker is disabled. Terminal ledger rows will accumulate indefinitely.");
    } else {
        start_purge_worker(db.clone(), config.event_retention.clone());
    }
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let stale_event_lease = config.stale_event_lease;
    let srv = HttpServer::new(move || {
        let api = ReconciliationApi::new(db.clone(), producers.clone()).with_stale_event_lease(stale_event_lease);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bps::access_log"))
            .app_data(web::Data::new(api))
            .service(health)
            .service(
                web::scope("/webhooks")
                    .service(OrderWebhookRoute::<SqliteDatabase>::new())
                    .service(ReservationWebhookRoute::<SqliteDatabase>::new()),
            )
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
