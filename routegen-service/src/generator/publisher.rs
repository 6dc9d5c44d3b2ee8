//! Publication of built tables to the router.

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

use routegen_core::{Router, RoutingTable, TableDiff};

use super::{GeneratorState, GeneratorStats};

/// Outcome of a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Published {
    /// The router received the table.
    Loaded,
    /// The table equals the current one; the router was not called.
    Unchanged,
    /// The router refused the table; the previous one stays current.
    Rejected,
    /// The generator was shut down; the table was dropped.
    Discarded,
}

#[derive(Debug, Default)]
struct Counters {
    publishes: AtomicU64,
    unchanged: AtomicU64,
    failures: AtomicU64,
    publish_failures: AtomicU64,
}

/// State shared between the generator handle and its worker.
///
/// The current table is only written by the worker and is swapped atomically,
/// so readers see either the previous table or the complete new one.
pub(crate) struct Publisher {
    router: Arc<dyn Router>,
    current: ArcSwapOption<RoutingTable>,
    state: watch::Sender<GeneratorState>,
    /// Set once on shutdown. Held for the whole router call, so no load can
    /// start after shutdown returns.
    stopped: Mutex<bool>,
    counters: Counters,
}

impl Publisher {
    pub(crate) fn new(router: Arc<dyn Router>) -> Self {
        let (state, _) = watch::channel(GeneratorState::Uninitialized);
        Self {
            router,
            current: ArcSwapOption::empty(),
            state,
            stopped: Mutex::new(false),
            counters: Counters::default(),
        }
    }

    pub(crate) fn current(&self) -> Option<Arc<RoutingTable>> {
        self.current.load_full()
    }

    pub(crate) fn state(&self) -> GeneratorState {
        *self.state.borrow()
    }

    pub(crate) fn watch_state(&self) -> watch::Receiver<GeneratorState> {
        self.state.subscribe()
    }

    pub(crate) fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    pub(crate) fn stats(&self) -> GeneratorStats {
        GeneratorStats {
            publishes: self.counters.publishes.load(Ordering::Relaxed),
            unchanged: self.counters.unchanged.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            publish_failures: self.counters.publish_failures.load(Ordering::Relaxed),
        }
    }

    /// Mark the generator stopped. Returns `false` if it already was.
    pub(crate) fn stop(&self) -> bool {
        let mut stopped = self.stopped.lock();
        if *stopped {
            return false;
        }
        *stopped = true;
        self.state.send_replace(GeneratorState::Stopped);
        true
    }

    /// Record a failed fetch or build.
    pub(crate) fn failed(&self, failures: u32) {
        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        self.transition(GeneratorState::Retrying { failures });
    }

    /// Hand `table` to the router unless it equals the current one.
    ///
    /// The shutdown gate is held while the router loads, so the router must not
    /// start or shut down the generator from inside `load`.
    pub(crate) fn publish(&self, table: RoutingTable) -> Published {
        let stopped = self.stopped.lock();
        if *stopped {
            debug!(
                "Discarding routing table generation {} built after shutdown",
                table.generation()
            );
            return Published::Discarded;
        }

        let current = self.current.load_full();
        if current.as_deref() == Some(&table) {
            self.counters.unchanged.fetch_add(1, Ordering::Relaxed);
            debug!("Routing table generation {} is unchanged, not publishing", table.generation());
            self.transition(GeneratorState::Serving);
            return Published::Unchanged;
        }

        let diff = match &current {
            Some(current) => current.diff(&table),
            None => TableDiff {
                added: table.entries().keys().cloned().collect(),
                ..TableDiff::default()
            },
        };
        let table = Arc::new(table);
        if let Err(err) = self.router.load(Arc::clone(&table)) {
            self.counters.publish_failures.fetch_add(1, Ordering::Relaxed);
            error!("Router rejected routing table generation {}: {}", table.generation(), err);
            // The router keeps whatever it had before.
            self.transition(if current.is_some() {
                GeneratorState::Serving
            } else {
                GeneratorState::Uninitialized
            });
            return Published::Rejected;
        }

        self.current.store(Some(Arc::clone(&table)));
        self.counters.publishes.fetch_add(1, Ordering::Relaxed);
        drop(stopped);

        info!(
            "Published routing table generation {} with {} endpoints \
             ({} added, {} removed, {} changed)",
            table.generation(),
            table.len(),
            diff.added.len(),
            diff.removed.len(),
            diff.changed.len()
        );
        for endpoint in &diff.added {
            debug!("Added endpoint {endpoint}");
        }
        for endpoint in &diff.removed {
            debug!("Removed endpoint {endpoint}");
        }
        self.transition(GeneratorState::Serving);
        Published::Loaded
    }

    fn transition(&self, next: GeneratorState) {
        self.state.send_if_modified(|state| {
            if *state == next || *state == GeneratorState::Stopped {
                return false;
            }
            debug!("Routing generator state {:?} -> {:?}", state, next);
            *state = next;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routegen_core::{RouterError, SwapRouter};
    use std::sync::{OnceLock, Weak};

    struct RejectingRouter;

    impl Router for RejectingRouter {
        fn load(&self, _table: Arc<RoutingTable>) -> Result<(), RouterError> {
            Err(RouterError::Rejected("no capacity".to_string()))
        }
    }

    /// Reads the publisher back while it is loading.
    #[derive(Default)]
    struct ObservingRouter {
        publisher: OnceLock<Weak<Publisher>>,
        seen: parking_lot::Mutex<Vec<(GeneratorState, bool)>>,
    }

    impl Router for ObservingRouter {
        fn load(&self, _table: Arc<RoutingTable>) -> Result<(), RouterError> {
            if let Some(publisher) = self.publisher.get().and_then(Weak::upgrade) {
                let observed = (publisher.state(), publisher.current().is_some());
                self.seen.lock().push(observed);
            }
            Ok(())
        }
    }

    fn table(generation: u64) -> RoutingTable {
        RoutingTable::new(Default::default(), generation)
    }

    #[test]
    fn rejected_table_is_recorded_by_the_publisher() {
        let publisher = Publisher::new(Arc::new(RejectingRouter));

        assert_eq!(publisher.publish(table(1)), Published::Rejected);

        assert!(publisher.current().is_none());
        assert_eq!(publisher.state(), GeneratorState::Uninitialized);
        assert_eq!(publisher.stats().publish_failures, 1);
        assert_eq!(publisher.stats().publishes, 0);
    }

    #[test]
    fn equal_table_is_not_loaded_twice() {
        let router = Arc::new(SwapRouter::new());
        let publisher = Publisher::new(Arc::clone(&router) as Arc<dyn Router>);

        assert_eq!(publisher.publish(table(1)), Published::Loaded);
        assert_eq!(publisher.publish(table(2)), Published::Unchanged);

        assert_eq!(router.loads(), 1);
        assert_eq!(publisher.state(), GeneratorState::Serving);
    }

    #[test]
    fn router_may_read_generator_state_while_loading() {
        let router = Arc::new(ObservingRouter::default());
        let publisher = Arc::new(Publisher::new(Arc::clone(&router) as Arc<dyn Router>));
        let _ = router.publisher.set(Arc::downgrade(&publisher));

        assert_eq!(publisher.publish(table(1)), Published::Loaded);

        assert_eq!(*router.seen.lock(), vec![(GeneratorState::Uninitialized, false)]);
    }

    #[test]
    fn nothing_is_loaded_after_stop() {
        let router = Arc::new(SwapRouter::new());
        let publisher = Publisher::new(Arc::clone(&router) as Arc<dyn Router>);

        assert!(publisher.stop());
        assert!(!publisher.stop());

        assert_eq!(publisher.publish(table(1)), Published::Discarded);
        assert_eq!(router.loads(), 0);
        assert_eq!(publisher.state(), GeneratorState::Stopped);
    }
}
