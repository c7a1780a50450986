use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::{RefreshError, Result},
    reconcile::{Reconciler, RefreshReport},
    status::RefreshStatus,
};

const MIN_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Deadline for a single cycle. `None` lets a cycle run unbounded.
    pub cycle_timeout: Option<Duration>,
    /// Run a cycle on the first tick instead of waiting one interval.
    pub run_immediately: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            cycle_timeout: Some(Duration::from_secs(300)),
            run_immediately: false,
        }
    }
}

/// Runs refresh cycles one at a time until shut down.
///
/// A trigger that arrives while a cycle is in flight is dropped and counted
/// as an overlap. A cycle cut short by its deadline or by shutdown commits
/// nothing.
pub struct RefreshScheduler {
    reconciler: Mutex<Reconciler>,
    status: Arc<RefreshStatus>,
    config: SchedulerConfig,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("config", &self.config)
            .field("in_flight", &self.reconciler.try_lock().is_err())
            .field("cancelled", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl RefreshScheduler {
    pub fn new(
        reconciler: Reconciler,
        status: Arc<RefreshStatus>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            reconciler: Mutex::new(reconciler),
            status,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn status(&self) -> Arc<RefreshStatus> {
        Arc::clone(&self.status)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Cancelling this token stops [`run`](Self::run) and abandons any
    /// in-flight cycle.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs one cycle now.
    ///
    /// Returns `Ok(None)` without touching the catalog when another cycle is
    /// still running.
    pub async fn run_once(&self) -> Result<Option<RefreshReport>> {
        let Ok(mut reconciler) = self.reconciler.try_lock() else {
            self.status.record_overlap();
            warn!(
                target: "refresh::scheduler",
                "refresh already in progress; skipping trigger"
            );
            return Ok(None);
        };

        let cycle = reconciler.refresh_at(Utc::now());
        let outcome = match self.config.cycle_timeout {
            Some(limit) => tokio::time::timeout(limit, cycle)
                .await
                .unwrap_or(Err(RefreshError::Timeout(limit))),
            None => cycle.await,
        };

        match outcome {
            Ok(report) => {
                self.status.record_success(&report, Utc::now());
                Ok(Some(report))
            }
            Err(err) => {
                self.status.record_failure(err.to_string(), Utc::now());
                Err(err)
            }
        }
    }

    /// Ticks every `interval` until the shutdown token fires.
    ///
    /// Failed cycles are logged and the loop carries on with the previous
    /// snapshot. Ticks missed behind a slow cycle are not replayed.
    pub async fn run(&self) {
        let mut ticker = interval(self.config.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if !self.config.run_immediately {
            // the first tick completes immediately
            ticker.tick().await;
        }

        info!(
            target: "refresh::scheduler",
            interval = ?self.config.interval,
            timeout = ?self.config.cycle_timeout,
            "refresh scheduler started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!(target: "refresh::scheduler", "refresh scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    debug!(target: "refresh::scheduler", "refresh tick");
                    tokio::select! {
                        _ = self.shutdown.cancelled() => {
                            info!(
                                target: "refresh::scheduler",
                                "shutdown during refresh; abandoning cycle"
                            );
                            break;
                        }
                        result = self.run_once() => {
                            if let Err(err) = result {
                                warn!(
                                    target: "refresh::scheduler",
                                    error = %err,
                                    "refresh cycle failed; keeping previous snapshot"
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}
