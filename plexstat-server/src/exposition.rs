//! Prometheus text format (0.0.4) rendering of the aggregate counters.
//!
//! Every scrape loads a counter snapshot into a fresh local recorder and
//! renders that. Nothing is installed globally; [`AggregateCounters`] stays
//! the only place totals are kept.
//!
//! [`AggregateCounters`]: plexstat_core::AggregateCounters

use metrics::{Label, counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use plexstat_core::{CounterSnapshot, StatusSnapshot};
use plexstat_model::MediaLabels;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub const ITEMS_COUNT: &str = "plex_media_items_count_total";
pub const ITEMS_BYTES: &str = "plex_media_items_bytes_total";
pub const REFRESH_TOTAL: &str = "plex_collector_refresh_total";
pub const LAST_SUCCESS: &str = "plex_collector_last_refresh_success_timestamp_seconds";
pub const TRACKED_ITEMS: &str = "plex_collector_tracked_items";

/// Renders both media gauges followed by the collector's own metrics.
pub fn render(counters: &CounterSnapshot, status: &StatusSnapshot) -> String {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        describe(status);
        record(counters, status);
    });

    handle.render()
}

fn describe(status: &StatusSnapshot) {
    describe_gauge!(ITEMS_COUNT, "The total count of media items.");
    describe_gauge!(ITEMS_BYTES, "The total bytes size of media items.");
    describe_counter!(REFRESH_TOTAL, "Refresh cycles by outcome.");
    describe_gauge!(
        TRACKED_ITEMS,
        "Media items tracked after the last successful refresh."
    );
    if status.last_success.is_some() {
        describe_gauge!(LAST_SUCCESS, "Unix time of the last successful refresh.");
    }
}

fn record(counters: &CounterSnapshot, status: &StatusSnapshot) {
    for (labels, totals) in counters.iter() {
        gauge!(ITEMS_COUNT, partition_labels(labels)).set(totals.items as f64);
        gauge!(ITEMS_BYTES, partition_labels(labels)).set(totals.bytes as f64);
    }

    for (outcome, value) in [
        ("success", status.successes),
        ("failure", status.failures),
        ("overlap", status.overlaps),
    ] {
        counter!(REFRESH_TOTAL, "outcome" => outcome).absolute(value);
    }

    if let Some(last_success) = status.last_success {
        gauge!(LAST_SUCCESS).set(last_success.timestamp() as f64);
    }

    let tracked = status.last_report.as_ref().map_or(0, |r| r.tracked);
    gauge!(TRACKED_ITEMS).set(tracked as f64);
}

fn partition_labels(labels: &MediaLabels) -> Vec<Label> {
    labels
        .pairs()
        .into_iter()
        .map(|(name, value)| Label::new(name, value))
        .collect()
}
