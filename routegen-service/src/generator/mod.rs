//! The routing generator: keeps the router's table in step with the topology.
//!
//! A single background task fetches the topology, builds a table and publishes
//! it whenever a [`TopologyNotifier`] reports a change, when the optional
//! refresh period elapses, or when a failed attempt is due for a retry.
//! Failures are retried forever at a fixed interval and never unpublish the
//! last good table. Tables equal to the current one are not handed to the router.

mod failure_log;
mod publisher;
mod worker;

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use routegen_core::{Router, RoutingTable, TopologySource};

use self::publisher::Publisher;
use self::worker::Worker;
use crate::config::GeneratorConfig;
use crate::error::GeneratorError;

/// Lifecycle of a [`RoutingGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// No table has been published yet.
    Uninitialized,
    /// A table has been published and is believed current.
    Serving,
    /// The last fetch or build failed; another attempt is scheduled.
    Retrying {
        /// Consecutive failed attempts.
        failures: u32,
    },
    /// The generator was shut down.
    Stopped,
}

/// Counters describing what the generator has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorStats {
    /// Tables handed to the router.
    pub publishes: u64,
    /// Successful builds that matched the current table.
    pub unchanged: u64,
    /// Failed fetches or builds.
    pub failures: u64,
    /// Tables the router rejected.
    pub publish_failures: u64,
}

/// Announces topology changes to a running generator.
///
/// Notifying never blocks, so it is safe to call from the thread that delivers
/// configuration callbacks.
#[derive(Debug, Clone)]
pub struct TopologyNotifier {
    sender: mpsc::UnboundedSender<()>,
}

impl TopologyNotifier {
    /// Report that the topology may have changed. Returns `false` once the
    /// generator has shut down.
    pub fn notify(&self) -> bool {
        self.sender.send(()).is_ok()
    }
}

/// Subscribes to topology changes and keeps a [`Router`] loaded with the
/// current routing table.
pub struct RoutingGenerator {
    source: Arc<dyn TopologySource>,
    publisher: Arc<Publisher>,
    config: GeneratorConfig,
    notifier: TopologyNotifier,
    notifications: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RoutingGenerator {
    /// Create a generator. Nothing happens until [`start`](Self::start) is called.
    pub fn new(
        source: Arc<dyn TopologySource>,
        router: Arc<dyn Router>,
        config: GeneratorConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            source,
            publisher: Arc::new(Publisher::new(router)),
            config,
            notifier: TopologyNotifier { sender },
            notifications: Mutex::new(Some(receiver)),
            task: Mutex::new(None),
        }
    }

    /// Spawn the worker on the current tokio runtime. Does not wait for the
    /// first table. Starting a running generator is a no-op.
    pub fn start(&self) -> Result<(), GeneratorError> {
        let runtime = Handle::try_current().map_err(|_| GeneratorError::NoRuntime)?;
        if self.publisher.is_stopped() {
            return Err(GeneratorError::Stopped);
        }

        let mut task = self.task.lock();
        if task.is_some() {
            debug!("Routing generator already started");
            return Ok(());
        }
        let notifications = self.notifications.lock().take().ok_or(GeneratorError::Stopped)?;
        let worker = Worker::new(
            Arc::clone(&self.source),
            Arc::clone(&self.publisher),
            notifications,
            &self.config,
        );
        *task = Some(runtime.spawn(worker.run()));
        info!(
            "Routing generator started, retrying failures every {} ms",
            self.config.retry_interval().as_millis()
        );
        Ok(())
    }

    /// A handle for announcing topology changes.
    pub fn notifier(&self) -> TopologyNotifier {
        self.notifier.clone()
    }

    /// The table currently believed valid; `None` until the first publish.
    pub fn routing_table(&self) -> Option<Arc<RoutingTable>> {
        self.publisher.current()
    }

    /// The current lifecycle state.
    pub fn state(&self) -> GeneratorState {
        self.publisher.state()
    }

    /// Observe state transitions, e.g. to wait until the generator is serving.
    pub fn watch_state(&self) -> watch::Receiver<GeneratorState> {
        self.publisher.watch_state()
    }

    /// What the generator has done so far.
    pub fn stats(&self) -> GeneratorStats {
        self.publisher.stats()
    }

    /// Stop the worker and any pending retry. Idempotent.
    ///
    /// Once this returns the router is not called again, even if a build was in
    /// flight. The last published table stays loaded.
    pub fn shutdown(&self) {
        if !self.publisher.stop() {
            return;
        }
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        self.notifications.lock().take();
        info!("Routing generator stopped");
    }
}

impl Drop for RoutingGenerator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
