#![allow(dead_code)]

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, TimeZone, Utc};
use plexstat_core::{AggregateCounters, InMemoryCatalog, Reconciler, Totals};
use plexstat_model::{
    CatalogNode, ContainerNode, LibrarySection, MediaLabels, MediaPart, MediaVariant,
};

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn section(key: &str, kind: &str, updated_at: i64) -> LibrarySection {
    LibrarySection {
        key: key.to_string(),
        title: format!("{kind} library {key}"),
        kind: kind.to_string(),
        updated_at: Some(at(updated_at)),
    }
}

/// A single-part variant: `channels` ch `codec`, h264 at `resolution`.
pub fn variant(id: i64, channels: u32, codec: &str, resolution: &str, size: u64) -> MediaVariant {
    MediaVariant {
        id,
        deleted_at: None,
        audio_channels: channels,
        audio_codec: codec.to_string(),
        video_codec: "h264".to_string(),
        video_resolution: resolution.to_string(),
        parts: vec![MediaPart { size }],
    }
}

pub fn node(node_type: &str, rating_key: &str, media: Vec<MediaVariant>) -> CatalogNode {
    CatalogNode {
        node_type: node_type.to_string(),
        rating_key: rating_key.to_string(),
        title: format!("{node_type} {rating_key}"),
        parent_rating_key: None,
        grandparent_rating_key: None,
        media,
    }
}

pub fn movie(rating_key: &str, media: Vec<MediaVariant>) -> CatalogNode {
    node("movie", rating_key, media)
}

pub fn container(section_key: &str, nodes: Vec<CatalogNode>) -> ContainerNode {
    ContainerNode {
        library_section_id: Some(section_key.to_string()),
        nodes,
    }
}

pub struct Harness {
    pub catalog: Arc<InMemoryCatalog>,
    pub counters: Arc<AggregateCounters>,
    pub reconciler: Reconciler,
}

impl Harness {
    pub fn new() -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        let counters = Arc::new(AggregateCounters::new());
        let reconciler = Reconciler::new(catalog.clone(), counters.clone());
        Self {
            catalog,
            counters,
            reconciler,
        }
    }

    /// Partitions as currently held by the counters, zeroed ones dropped.
    pub fn live_partitions(&self) -> BTreeMap<MediaLabels, Totals> {
        self.counters
            .snapshot()
            .iter()
            .filter(|(_, totals)| *totals != Totals::default())
            .cloned()
            .collect()
    }

    /// Partitions recomputed from scratch over the tracked items.
    pub fn expected_partitions(&self) -> BTreeMap<MediaLabels, Totals> {
        let mut expected: BTreeMap<MediaLabels, Totals> = BTreeMap::new();
        for item in self.reconciler.store().items().values() {
            let totals = expected.entry(item.labels()).or_default();
            totals.items += 1;
            totals.bytes += item.size_delta();
        }
        expected
    }

    pub fn assert_additive(&self) {
        assert_eq!(self.live_partitions(), self.expected_partitions());
    }
}
