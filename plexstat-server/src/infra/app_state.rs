use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use plexstat_core::{AggregateCounters, RefreshStatus};

/// Read-only handles shared with the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub counters: Arc<AggregateCounters>,
    pub status: Arc<RefreshStatus>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(counters: Arc<AggregateCounters>, status: Arc<RefreshStatus>) -> Self {
        Self {
            counters,
            status,
            started_at: Utc::now(),
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("partitions", &self.counters.snapshot().len())
            .field("started_at", &self.started_at)
            .finish()
    }
}
