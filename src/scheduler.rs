use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::error;

use crate::aggregator::Aggregator;
use crate::models::Snapshot;
use crate::store::SnapshotStore;

/// Drives the polling loop: one cycle immediately at startup, then one
/// per interval. The loop awaits each cycle, and missed ticks are
/// skipped, so at most one cycle runs at a time and an overrunning
/// cycle drops the tick that fired under it.
pub struct Scheduler {
    aggregator: Arc<Aggregator>,
    store: SnapshotStore,
    interval: Duration,
}

impl Scheduler {
    pub fn new(aggregator: Arc<Aggregator>, store: SnapshotStore, interval: Duration) -> Self {
        Self {
            aggregator,
            store,
            interval,
        }
    }

    pub async fn run(self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // The first tick completes immediately.
            ticker.tick().await;

            let aggregator = Arc::clone(&self.aggregator);
            if let Some(snapshot) = guarded(async move { aggregator.run_cycle().await }).await {
                self.store.replace(snapshot);
            }
        }
    }
}

/// Runs one cycle in its own task so a panic cannot take the loop down.
/// A crashed cycle yields `None`: no store update, previous snapshot
/// stays live.
async fn guarded<F>(cycle: F) -> Option<Snapshot>
where
    F: Future<Output = Snapshot> + Send + 'static,
{
    match tokio::spawn(cycle).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            error!("Polling cycle crashed, keeping previous snapshot: {e}");
            None
        }
    }
}
