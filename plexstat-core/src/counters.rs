use std::collections::BTreeMap;

use parking_lot::RwLock;
use plexstat_model::{MediaItem, MediaLabels};

/// Item count and byte size held for one label partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub items: i64,
    pub bytes: i64,
}

/// A signed adjustment to one label partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDelta {
    pub labels: MediaLabels,
    pub items: i64,
    pub bytes: i64,
}

impl CounterDelta {
    /// Counts `item` into its partition.
    pub fn add(item: &MediaItem) -> Self {
        Self {
            labels: item.labels(),
            items: 1,
            bytes: item.size_delta(),
        }
    }

    /// Takes `item` back out of its partition.
    pub fn remove(item: &MediaItem) -> Self {
        Self {
            labels: item.labels(),
            items: -1,
            bytes: -item.size_delta(),
        }
    }
}

/// Label-partitioned running totals of tracked media items.
///
/// Only ever adjusted by deltas. A partition that drains to zero keeps
/// reading zero rather than disappearing, so scrapers see the gauge drop.
#[derive(Debug, Default)]
pub struct AggregateCounters {
    partitions: RwLock<BTreeMap<MediaLabels, Totals>>,
}

impl AggregateCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adjust(&self, labels: &MediaLabels, item_delta: i64, byte_delta: i64) {
        let mut partitions = self.partitions.write();
        let totals = partitions.entry(labels.clone()).or_default();
        totals.items = totals.items.saturating_add(item_delta);
        totals.bytes = totals.bytes.saturating_add(byte_delta);
    }

    pub fn apply(&self, delta: &CounterDelta) {
        self.adjust(&delta.labels, delta.items, delta.bytes);
    }

    pub fn get(&self, labels: &MediaLabels) -> Totals {
        self.partitions
            .read()
            .get(labels)
            .copied()
            .unwrap_or_default()
    }

    /// Sum across every partition.
    pub fn total(&self) -> Totals {
        self.partitions
            .read()
            .values()
            .fold(Totals::default(), |acc, t| Totals {
                items: acc.items.saturating_add(t.items),
                bytes: acc.bytes.saturating_add(t.bytes),
            })
    }

    /// Point-in-time copy of every partition, ordered by labels.
    pub fn snapshot(&self) -> CounterSnapshot {
        let partitions = self
            .partitions
            .read()
            .iter()
            .map(|(labels, totals)| (labels.clone(), *totals))
            .collect();
        CounterSnapshot { partitions }
    }
}

/// Owned copy of [`AggregateCounters`] for readers such as the exposition
/// endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    partitions: Vec<(MediaLabels, Totals)>,
}

impl CounterSnapshot {
    pub fn iter(&self) -> impl Iterator<Item = &(MediaLabels, Totals)> {
        self.partitions.iter()
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}
