use std::env;

use boutique_payment_engine::{traits::EventRetention, DEFAULT_STALE_EVENT_LEASE};
use bpg_common::helpers::parse_boolean_flag;
use chrono::Duration;
use log::*;

const DEFAULT_BPG_HOST: &str = "127.0.0.1";
const DEFAULT_BPG_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/boutique_store.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How long a `Processing` ledger row is honoured before a redelivery may take the claim over. Keep this longer
    /// than any plausible fulfilment transaction.
    pub stale_event_lease: Duration,
    /// Retention policy applied by the ledger purge worker.
    pub event_retention: EventRetention,
    /// When true, terminal ledger rows are kept forever and the purge worker is not started.
    pub disable_event_purge: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BPG_HOST.to_string(),
            port: DEFAULT_BPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            stale_event_lease: DEFAULT_STALE_EVENT_LEASE,
            event_retention: EventRetention::default(),
            disable_event_purge: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = ServerConfig::default();
        let host = env::var("BPG_HOST").ok().unwrap_or_else(|| DEFAULT_BPG_HOST.into());
        let port = env::var("BPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BPG_PORT. {e} Using the default, {DEFAULT_BPG_PORT}, instead."
                    );
                    DEFAULT_BPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BPG_PORT);
        let database_url = env::var("BPG_DATABASE_URL").unwrap_or_else(|_| {
            info!("🪛️ BPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let stale_event_lease = duration_from_env(
            "BPG_STALE_EVENT_LEASE_SECONDS",
            Duration::seconds,
            defaults.stale_event_lease,
        );
        let event_retention = EventRetention {
            processed_for: duration_from_env(
                "BPG_EVENT_RETENTION_DAYS",
                Duration::days,
                defaults.event_retention.processed_for,
            ),
            errored_for: duration_from_env(
                "BPG_EVENT_ERROR_RETENTION_DAYS",
                Duration::days,
                defaults.event_retention.errored_for,
            ),
            batch_size: env::var("BPG_EVENT_PURGE_BATCH")
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .filter(|b| *b > 0)
                .unwrap_or(defaults.event_retention.batch_size),
        };
        let disable_event_purge = parse_boolean_flag(env::var("BPG_DISABLE_EVENT_PURGE").ok(), false);
        Self { host, port, database_url, stale_event_lease, event_retention, disable_event_purge }
    }
}

fn duration_from_env(var: &str, unit: fn(i64) -> Duration, default: Duration) -> Duration {
    match env::var(var) {
        Ok(s) => match s.parse::<i64>() {
            Ok(n) if n > 0 => unit(n),
            _ => {
                error!("🪛️ {s} is not a valid value for {var}. Using the default instead.");
                default
            },
        },
        Err(_) => default,
    }
}
