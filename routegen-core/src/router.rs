//! The data-plane side of table publication.

use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::backend::Target;
use crate::domain::endpoint::Endpoint;
use crate::domain::routing::RoutingTable;
use crate::error::RouterError;

/// Receives routing tables for the data plane.
pub trait Router: Send + Sync {
    /// Replace the table the data plane routes with.
    ///
    /// The switch must be atomic for any single request: a lookup sees either the
    /// old or the new table, never a mix.
    ///
    /// The routing generator calls this while holding its shutdown lock. An
    /// implementation must not start or shut down the generator from inside
    /// `load`, which would deadlock; reading its table or state is fine.
    fn load(&self, table: Arc<RoutingTable>) -> Result<(), RouterError>;
}

/// A lock-free router that holds the active routing table.
///
/// Uses `ArcSwapOption` so a table swap never blocks lookups on the hot path
/// (like `RwLock` would).
#[derive(Debug, Default)]
pub struct SwapRouter {
    table: ArcSwapOption<RoutingTable>,
    loads: AtomicU64,
}

impl SwapRouter {
    /// Create a router with no table loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active table, if one has been loaded.
    pub fn current(&self) -> Option<Arc<RoutingTable>> {
        self.table.load_full()
    }

    /// Resolve an endpoint against the active table.
    pub fn lookup(&self, endpoint: &Endpoint) -> Option<Target> {
        let guard = self.table.load();
        guard.as_ref().and_then(|table| table.get(endpoint).cloned())
    }

    /// Number of tables loaded so far.
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Acquire)
    }
}

impl Router for SwapRouter {
    fn load(&self, table: Arc<RoutingTable>) -> Result<(), RouterError> {
        self.table.store(Some(table));
        self.loads.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backend::Real;
    use crate::domain::ids::{ApplicationId, ClusterId, RoutingMethod, ZoneId};
    use std::collections::BTreeMap;

    fn table(hosts: usize, generation: u64) -> RoutingTable {
        let reals = (0..hosts).map(|i| Real::new(format!("host{i}"), 4443, 1, true)).collect();
        let target = Target::new(
            ApplicationId::new("vespa", "music", "default"),
            ClusterId::new("default"),
            ZoneId::new("prod", "us-north-1"),
            reals,
        )
        .unwrap();
        let endpoint = Endpoint::new(
            "music.vespa.us-north-1.vespa.oath.cloud",
            RoutingMethod::SharedLayer4,
        );
        RoutingTable::new(BTreeMap::from([(endpoint, target)]), generation)
    }

    #[test]
    fn load_replaces_table_and_counts() {
        let router = SwapRouter::new();
        assert!(router.current().is_none());

        router.load(Arc::new(table(1, 1))).unwrap();
        router.load(Arc::new(table(2, 2))).unwrap();

        assert_eq!(router.loads(), 2);
        assert_eq!(router.current().unwrap().generation(), 2);
        let endpoint = Endpoint::new(
            "music.vespa.us-north-1.vespa.oath.cloud",
            RoutingMethod::SharedLayer4,
        );
        assert_eq!(router.lookup(&endpoint).unwrap().reals().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn readers_never_observe_partial_tables() {
        let router = Arc::new(SwapRouter::new());
        router.load(Arc::new(table(1, 1))).unwrap();

        let reader = {
            let router = Arc::clone(&router);
            tokio::spawn(async move {
                for _ in 0..1_000 {
                    let current = router.current().unwrap();
                    let reals = current.iter().next().unwrap().1.reals().len();
                    // Generation n always carries n reals.
                    assert_eq!(reals as u64, current.generation());
                    tokio::task::yield_now().await;
                }
            })
        };

        for generation in 2..50 {
            router.load(Arc::new(table(generation as usize, generation))).unwrap();
            tokio::task::yield_now().await;
        }
        reader.await.unwrap();
    }
}
