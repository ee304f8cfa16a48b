//! Process-local snapshot store for tests and ephemeral workspaces.

use super::{PersistResult, SnapshotStore};
use crate::model::Snapshot;

#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    snapshot: Snapshot,
    saves: usize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `snapshot` already persisted.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self { snapshot, saves: 0 }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> PersistResult<Snapshot> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &Snapshot) -> PersistResult<()> {
        self.snapshot = snapshot.clone();
        self.saves += 1;
        Ok(())
    }
}
