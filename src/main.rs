mod aggregator;
mod analyzer;
mod api;
mod config;
mod error;
mod models;
mod scheduler;
mod sources;
mod store;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

use crate::aggregator::Aggregator;
use crate::api::{build_router, AppState};
use crate::config::AppConfig;
use crate::scheduler::Scheduler;
use crate::sources::device::DeviceAdapter;
use crate::sources::exchange::ExchangeAdapter;
use crate::sources::host::HostAdapter;
use crate::sources::{CommandRunner, ProcessRunner};
use crate::store::SnapshotStore;

const BANNER: &str = r#"
  _                              _           _
 | |__   ___  _ __ ___   ___  __| | __ _ ___| |__
 | '_ \ / _ \| '_ ` _ \ / _ \/ _` |/ _` / __| '_ \
 | | | | (_) | | | | | |  __/ (_| | (_| \__ \ | | |
 |_| |_|\___/|_| |_| |_|\___|\__,_|\__,_|___/_| |_|
  Firefly Command Center
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homedash=info".into()),
        )
        .compact()
        .init();

    println!("{BANNER}");

    // ── Config ──────────────────────────────────────────────────
    let mut cfg = AppConfig::load(None)?;
    cfg.apply_env();
    info!(
        "Config loaded — poll every {}s, API on :{}",
        cfg.poll.interval_secs, cfg.api.port
    );

    // ── Source adapters ─────────────────────────────────────────
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);

    let devices: Vec<DeviceAdapter> = cfg
        .devices
        .iter()
        .map(|d| DeviceAdapter::new(d.clone(), Arc::clone(&runner)))
        .collect();
    let hosts: Vec<HostAdapter> = cfg
        .hosts
        .iter()
        .map(|h| HostAdapter::new(h.clone(), Arc::clone(&runner)))
        .collect();
    let exchange = ExchangeAdapter::new(cfg.exchange.clone());

    info!(
        "Sources: {} device(s), {} host(s), exchange account {}",
        devices.len(),
        hosts.len(),
        exchange.address()
    );

    let aggregator = Arc::new(Aggregator::new(devices, hosts, exchange));
    let store = SnapshotStore::new();

    // ── Spawn: HTTP API ─────────────────────────────────────────
    let state = AppState {
        store: store.clone(),
        aggregator: Arc::clone(&aggregator),
        start_time: std::time::Instant::now(),
    };

    let api_port = cfg.api.port;
    let router = build_router(state);
    tokio::spawn(async move {
        let addr = format!("0.0.0.0:{api_port}");
        let listener = TcpListener::bind(&addr).await.expect("Failed to bind API port");
        info!("🔥 API listening on http://{addr}");
        axum::serve(listener, router).await.expect("API server crashed");
    });

    // ── Main loop: polling cycles ───────────────────────────────
    let interval = Duration::from_secs(cfg.poll.interval_secs);
    info!("Scheduler started — first cycle now, then every {}s", cfg.poll.interval_secs);
    Scheduler::new(aggregator, store, interval).run().await;

    Ok(())
}
