use std::sync::{Arc, RwLock};

use crate::models::Snapshot;

/// Holder of the latest snapshot. Cloning the store is cheap — all
/// clones share one slot.
///
/// Single writer (the scheduler's cycle), many readers (HTTP handlers).
/// Replacement is one pointer swap under the lock, so a reader either
/// gets the whole old snapshot or the whole new one; a reader holding
/// the previous `Arc` keeps a complete, consistent old view.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotStore {
    /// Starts out holding the default empty snapshot, so reads before
    /// the first cycle are well-defined.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, snapshot: Snapshot) {
        let mut slot = self.inner.write().expect("snapshot lock poisoned");
        *slot = Arc::new(snapshot);
    }

    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.inner.read().expect("snapshot lock poisoned"))
    }
}
