//! # plexstat core
//!
//! Turns a media server's hierarchical catalog into label-partitioned
//! aggregate gauges.
//!
//! Each refresh cycle walks every library that changed since the previous
//! cycle, flattens its tree into [`MediaItem`](plexstat_model::MediaItem)
//! records, and reconciles the result against the previous snapshot. Only the
//! difference is applied to the [`AggregateCounters`], so the gauges are never
//! recomputed from scratch.
//!
//! - [`catalog`]: the [`CatalogClient`] seam, the Plex HTTP client and an
//!   in-memory catalog for tests.
//! - [`flatten`]: depth-first traversal of catalog containers.
//! - [`reconcile`]: the per-cycle diff and commit.
//! - [`scheduler`]: serialized, cancellable periodic refreshes.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod catalog;
pub mod counters;
pub mod error;
pub mod flatten;
pub mod reconcile;
pub mod scheduler;
pub mod snapshot;
pub mod status;

pub use catalog::{CatalogClient, CatalogError, InMemoryCatalog, PlexClient};
pub use counters::{AggregateCounters, CounterDelta, CounterSnapshot, Totals};
pub use error::{RefreshError, Result};
pub use flatten::{NodeKind, TreeFlattener};
pub use reconcile::{Reconciler, Reconciliation, RefreshReport, reconcile};
pub use scheduler::{RefreshScheduler, SchedulerConfig};
pub use snapshot::SnapshotStore;
pub use status::{FailureRecord, RefreshStatus, StatusSnapshot};
