//! Where topology snapshots come from.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::error::FetchError;
use crate::topology::TopologySnapshot;

/// Delivers the current topology on demand.
///
/// Implementations may fail transiently. The caller is expected to retry, so a
/// failure must never leave the source unusable for later calls.
pub trait TopologySource: Send + Sync {
    /// Fetch the latest snapshot.
    fn get(&self) -> Result<TopologySnapshot, FetchError>;
}

impl<S: TopologySource + ?Sized> TopologySource for Arc<S> {
    fn get(&self) -> Result<TopologySnapshot, FetchError> {
        (**self).get()
    }
}

/// An in-memory topology source whose snapshot is replaced with [`set`](Self::set).
#[derive(Debug, Default)]
pub struct MemoryTopology {
    snapshot: ArcSwapOption<TopologySnapshot>,
}

impl MemoryTopology {
    /// Create a source that already holds a snapshot.
    pub fn new(snapshot: TopologySnapshot) -> Self {
        Self {
            snapshot: ArcSwapOption::from_pointee(snapshot),
        }
    }

    /// Create a source with nothing to deliver yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Atomically replace the snapshot returned by subsequent fetches.
    pub fn set(&self, snapshot: TopologySnapshot) {
        self.snapshot.store(Some(Arc::new(snapshot)));
    }
}

impl TopologySource for MemoryTopology {
    fn get(&self) -> Result<TopologySnapshot, FetchError> {
        self.snapshot
            .load_full()
            .map(|snapshot| (*snapshot).clone())
            .ok_or_else(|| FetchError::Unavailable("no topology has been set".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::ZoneId;

    fn snapshot(generation: u64) -> TopologySnapshot {
        TopologySnapshot {
            generation,
            zone: ZoneId::new("prod", "us-north-1"),
            routing_domain: "vespa.oath.cloud".to_string(),
            deployments: Vec::new(),
            rotations: Vec::new(),
        }
    }

    #[test]
    fn empty_source_is_unavailable() {
        let source = MemoryTopology::empty();
        assert!(matches!(source.get(), Err(FetchError::Unavailable(_))));
    }

    #[test]
    fn set_replaces_snapshot() {
        let source = Arc::new(MemoryTopology::new(snapshot(1)));
        assert_eq!(source.get().unwrap().generation, 1);
        source.set(snapshot(2));
        assert_eq!(source.get().unwrap().generation, 2);
    }
}
