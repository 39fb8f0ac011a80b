// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `booth serve` command implementation.
//!
//! Wires the SQLite store, kiosk lease pool, delivery dispatcher, and
//! session state machine together, then starts the HTTP gateway.

use std::sync::Arc;
use std::time::Duration;

use booth_config::BoothConfig;
use booth_core::BoothError;
use booth_delivery::Dispatcher;
use booth_gateway::AppState;
use booth_session::{SessionStateMachine, VerificationEngine};
use booth_storage::{Database, DeliveryLog, KioskLeasePool, SessionStore};
use tracing::{info, warn};

/// Runs the `booth serve` command.
pub async fn run_serve(config: BoothConfig) -> Result<(), BoothError> {
    init_tracing(&config.booth.log_level);

    info!(name = %config.booth.name, "starting booth serve");

    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    info!(path = %config.storage.database_path, "storage ready");

    let store = SessionStore::new(db.clone());
    let pool = KioskLeasePool::open(
        db.clone(),
        config.kiosks.count,
        config.kiosks.lease_timeout_secs,
        &config.kiosks.locations,
    )
    .await?;
    let log = DeliveryLog::new(db.clone());

    let dispatcher = Dispatcher::from_config(&config.delivery)?;
    info!(channel = %config.delivery.channel, "delivery dispatcher ready");

    let engine = VerificationEngine::new(
        config.verification.code_ttl_secs,
        config.verification.max_attempts,
    );

    let machine = Arc::new(SessionStateMachine::new(
        store, pool, log, dispatcher, engine,
    ));

    spawn_sweeper(machine.clone(), config.kiosks.lease_timeout_secs);

    let state = AppState {
        machine,
        max_photo_bytes: config.gateway.max_photo_bytes,
    };

    booth_gateway::start_server(&config.gateway, state).await
}

/// Periodic background sweep.
///
/// Expiry is also checked lazily on every read path, so this only exists
/// to reclaim rows on an idle deployment where nothing polls.
fn spawn_sweeper(machine: Arc<SessionStateMachine>, lease_timeout_secs: u64) {
    let period = Duration::from_secs(lease_timeout_secs.clamp(60, 600));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match machine.expire_stale().await {
                Ok((expired, purged)) if expired > 0 || purged > 0 => {
                    info!(expired, purged, "background sweep");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "background sweep failed"),
            }
        }
    });
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("booth={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
