use std::sync::Arc;

use anyhow::{Context, Result};
use plexstat_config::{Config, PlexConfig};
use plexstat_core::{
    AggregateCounters, CatalogClient, PlexClient, Reconciler, RefreshScheduler,
    RefreshStatus, SchedulerConfig,
};
use tracing::info;

use crate::infra::app_state::AppState;

/// A collector that has passed its startup checks and holds a committed
/// first snapshot.
#[derive(Debug)]
pub struct Collector {
    pub state: AppState,
    pub scheduler: Arc<RefreshScheduler>,
}

pub fn build_plex_client(config: &PlexConfig) -> Result<Arc<PlexClient>> {
    let client = PlexClient::new(config.url.clone(), &config.token, config.request_timeout)
        .context("failed to build Plex client")?;
    Ok(Arc::new(client))
}

pub fn scheduler_config(config: &Config) -> SchedulerConfig {
    SchedulerConfig {
        interval: config.refresh.interval,
        cycle_timeout: config.refresh.timeout,
        // the initial cycle runs during bootstrap
        run_immediately: false,
    }
}

/// Checks connectivity, then runs the initial refresh.
///
/// Either failure is returned as an error; the caller treats it as fatal.
pub async fn bootstrap(
    client: Arc<dyn CatalogClient>,
    scheduler_config: SchedulerConfig,
) -> Result<Collector> {
    let identity = client
        .ping()
        .await
        .context("connectivity check against the Plex server failed")?;
    info!(
        machine_identifier = %identity.machine_identifier,
        version = %identity.version,
        "connected to Plex server"
    );

    let counters = Arc::new(AggregateCounters::new());
    let status = Arc::new(RefreshStatus::new());
    let reconciler = Reconciler::new(client, Arc::clone(&counters));
    let scheduler = Arc::new(RefreshScheduler::new(
        reconciler,
        Arc::clone(&status),
        scheduler_config,
    ));

    scheduler
        .run_once()
        .await
        .context("initial refresh failed")?;

    Ok(Collector {
        state: AppState::new(counters, status),
        scheduler,
    })
}
