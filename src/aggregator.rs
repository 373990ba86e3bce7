use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::analyzer;
use crate::models::{PortfolioStatus, Snapshot};
use crate::sources::device::DeviceAdapter;
use crate::sources::exchange::ExchangeAdapter;
use crate::sources::host::HostAdapter;

/// Orchestrates one polling cycle across every configured source.
///
/// Each adapter runs in its own task, so a slow, failing or panicking
/// source never blocks or corrupts the others. Results land in
/// registration order; a failed source keeps its slot with a degraded
/// record instead of being dropped.
pub struct Aggregator {
    devices: Vec<Arc<DeviceAdapter>>,
    hosts: Vec<Arc<HostAdapter>>,
    exchange: Arc<ExchangeAdapter>,
}

impl Aggregator {
    pub fn new(
        devices: Vec<DeviceAdapter>,
        hosts: Vec<HostAdapter>,
        exchange: ExchangeAdapter,
    ) -> Self {
        Self {
            devices: devices.into_iter().map(Arc::new).collect(),
            hosts: hosts.into_iter().map(Arc::new).collect(),
            exchange: Arc::new(exchange),
        }
    }

    /// Device adapter lookup for the on-demand sync route.
    pub fn device(&self, id: &str) -> Option<&Arc<DeviceAdapter>> {
        self.devices.iter().find(|d| d.id() == id)
    }

    /// Run one full fetch → analyze pass. Infallible: every source
    /// failure becomes a degraded record in that source's slot.
    pub async fn run_cycle(&self) -> Snapshot {
        info!("📡 Fetching data from all sources...");

        let device_tasks: Vec<_> = self
            .devices
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                tokio::spawn(async move { adapter.fetch_status().await })
            })
            .collect();
        let host_tasks: Vec<_> = self
            .hosts
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                tokio::spawn(async move { adapter.fetch_status().await })
            })
            .collect();
        let exchange_task = {
            let adapter = Arc::clone(&self.exchange);
            tokio::spawn(async move { adapter.fetch_status().await })
        };

        // Join in registration order so slot order never depends on
        // which source answered first.
        let mut devices = Vec::with_capacity(self.devices.len());
        for (adapter, joined) in self.devices.iter().zip(join_all(device_tasks).await) {
            let status = match joined {
                Ok(Ok(status)) => {
                    info!("  ✅ Device {} fetched", adapter.id());
                    status
                }
                Ok(Err(e)) => {
                    warn!("  ❌ Device {} fetch failed: {e}", adapter.id());
                    adapter.offline_status()
                }
                Err(e) => {
                    warn!("  ❌ Device {} fetch panicked: {e}", adapter.id());
                    adapter.offline_status()
                }
            };
            devices.push(status);
        }

        let mut services = Vec::with_capacity(self.hosts.len());
        for (adapter, joined) in self.hosts.iter().zip(join_all(host_tasks).await) {
            let status = match joined {
                Ok(Ok(status)) => {
                    info!("  ✅ Host {} fetched", adapter.name());
                    status
                }
                Ok(Err(e)) => {
                    warn!("  ❌ Host {} fetch failed: {e}", adapter.name());
                    adapter.unavailable_status(&e.to_string())
                }
                Err(e) => {
                    warn!("  ❌ Host {} fetch panicked: {e}", adapter.name());
                    adapter.unavailable_status(&e.to_string())
                }
            };
            services.push(status);
        }

        let trading = match exchange_task.await {
            Ok(Ok(portfolio)) => {
                info!("  ✅ Trading data fetched");
                portfolio
            }
            Ok(Err(e)) => {
                warn!("  ❌ Trading fetch failed: {e}");
                PortfolioStatus::failed(self.exchange.address(), &e)
            }
            Err(e) => {
                warn!("  ❌ Trading fetch panicked: {e}");
                PortfolioStatus::failed(self.exchange.address(), &e)
            }
        };

        let mut snapshot = Snapshot {
            devices,
            services,
            threats: Vec::new(),
            opportunities: Vec::new(),
            trading: Some(trading),
            last_update: None,
        };

        let (threats, opportunities) = analyzer::analyze(&snapshot);
        info!("  🔴 Threats: {}", threats.len());
        info!("  🟢 Opportunities: {}", opportunities.len());
        snapshot.threats = threats;
        snapshot.opportunities = opportunities;
        snapshot.last_update = Some(Utc::now());

        snapshot
    }
}
