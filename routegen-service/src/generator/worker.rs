//! The background task driving fetch, build and publish cycles.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::debug;

use routegen_core::{RoutingTable, TableBuilder, TopologySource};

use super::failure_log::FailureLog;
use super::publisher::{Published, Publisher};
use crate::config::GeneratorConfig;
use crate::error::GeneratorError;

pub(crate) struct Worker {
    source: Arc<dyn TopologySource>,
    publisher: Arc<Publisher>,
    notifications: UnboundedReceiver<()>,
    retry_interval: Duration,
    refresh: Option<Interval>,
    failure_log: FailureLog,
    failures: u32,
}

impl Worker {
    pub(crate) fn new(
        source: Arc<dyn TopologySource>,
        publisher: Arc<Publisher>,
        notifications: UnboundedReceiver<()>,
        config: &GeneratorConfig,
    ) -> Self {
        let refresh = config.refresh_interval().map(|period| {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        Self {
            source,
            publisher,
            notifications,
            retry_interval: config.retry_interval(),
            refresh,
            failure_log: FailureLog::new(config.failure_log_interval),
            failures: 0,
        }
    }

    /// Run cycles until the task is aborted or every notifier is gone. The first
    /// cycle runs without waiting for a notification.
    pub(crate) async fn run(mut self) {
        loop {
            self.cycle().await;

            let retry = (self.failures > 0).then_some(self.retry_interval);
            select! {
                notification = self.notifications.recv() => {
                    if notification.is_none() {
                        debug!("Topology notifier closed, routing generator worker exiting");
                        return;
                    }
                    // A single fetch observes every change announced so far.
                    while self.notifications.try_recv().is_ok() {}
                },
                _ = sleep_or_never(retry) => debug!("Retrying topology refresh"),
                _ = tick_or_never(self.refresh.as_mut()) => debug!("Periodic topology refresh"),
            }
        }
    }

    async fn cycle(&mut self) {
        match self.fetch_and_build().await {
            Ok(table) => {
                self.failure_log.recovered();
                self.failures = 0;
                if self.publisher.publish(table) == Published::Rejected {
                    debug!("Keeping the previous routing table until the next refresh");
                }
            }
            Err(err) => {
                self.failures = self.failure_log.failed(&err, self.retry_interval.as_millis());
                self.publisher.failed(self.failures);
            }
        }
    }

    /// Fetching may block, so it runs on the blocking pool along with the build.
    async fn fetch_and_build(&self) -> Result<RoutingTable, GeneratorError> {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || -> Result<RoutingTable, GeneratorError> {
            let snapshot = source.get()?;
            Ok(TableBuilder::build(&snapshot)?)
        })
        .await
        .map_err(|e| GeneratorError::Interrupted(e.to_string()))?
    }
}

async fn sleep_or_never(delay: Option<Duration>) {
    match delay {
        Some(delay) => time::sleep(delay).await,
        None => pending().await,
    }
}

async fn tick_or_never(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}
