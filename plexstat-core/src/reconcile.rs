use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Instant,
};

use chrono::{DateTime, SubsecRound, Utc};
use plexstat_model::MediaItem;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    catalog::CatalogClient,
    counters::{AggregateCounters, CounterDelta},
    error::Result,
    flatten::TreeFlattener,
    snapshot::SnapshotStore,
};

/// Outcome of one committed refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Items tracked after the commit, retained ones included.
    pub tracked: usize,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Items kept from sections that were not walked this cycle.
    pub retained: usize,
    /// Repeated media ids dropped from the fresh catalog.
    pub duplicates: usize,
    pub walked_sections: usize,
    pub skipped_sections: Vec<String>,
}

impl RefreshReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.removed == 0
    }
}

/// Result of diffing a fresh flat item set against the tracked one.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Tracked items after the cycle: the fresh set plus retained residuals.
    pub items: HashMap<i64, MediaItem>,
    /// Counter adjustments in application order.
    pub deltas: Vec<CounterDelta>,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub retained: usize,
    pub duplicates: usize,
}

/// Classifies every item of `fresh` against `previous`.
///
/// An id seen for the first time is added. A known id whose tracked fields
/// moved is updated, which takes the old record out of its partition and
/// puts the new one into its own. Ids that were not seen again are removed,
/// unless their section is in `skipped`, in which case they are carried over
/// untouched. Within `fresh`, the first occurrence of an id wins.
pub fn reconcile(
    previous: &HashMap<i64, MediaItem>,
    fresh: Vec<MediaItem>,
    skipped: &HashSet<String>,
) -> Reconciliation {
    let mut outcome = Reconciliation {
        items: HashMap::with_capacity(fresh.len()),
        ..Default::default()
    };
    let mut residual: HashMap<i64, &MediaItem> =
        previous.iter().map(|(id, item)| (*id, item)).collect();

    for item in fresh {
        if outcome.items.contains_key(&item.id) {
            warn!(
                target: "refresh::diff",
                id = item.id,
                section = %item.section_key,
                "duplicate media id in catalog; keeping first occurrence"
            );
            outcome.duplicates += 1;
            continue;
        }

        match residual.remove(&item.id) {
            None => {
                outcome.deltas.push(CounterDelta::add(&item));
                outcome.added += 1;
            }
            Some(old) if item.tracked_fields_differ(old) => {
                debug!(
                    target: "refresh::diff",
                    id = item.id,
                    from = %old.labels(),
                    to = %item.labels(),
                    "media item changed"
                );
                outcome.deltas.push(CounterDelta::remove(old));
                outcome.deltas.push(CounterDelta::add(&item));
                outcome.updated += 1;
            }
            Some(_) => {}
        }

        outcome.items.insert(item.id, item);
    }

    let mut leftovers: Vec<&MediaItem> = residual.into_values().collect();
    leftovers.sort_unstable_by_key(|item| item.id);

    for old in leftovers {
        if skipped.contains(&old.section_key) {
            outcome.items.insert(old.id, old.clone());
            outcome.retained += 1;
        } else {
            outcome.deltas.push(CounterDelta::remove(old));
            outcome.removed += 1;
        }
    }

    outcome
}

/// Drives refresh cycles: walk, diff, apply, commit.
///
/// Owns the [`SnapshotStore`]; the counters are shared with readers.
pub struct Reconciler {
    client: Arc<dyn CatalogClient>,
    counters: Arc<AggregateCounters>,
    store: SnapshotStore,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("tracked", &self.store.len())
            .field("last_refresh", &self.store.last_refresh())
            .finish()
    }
}

impl Reconciler {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        counters: Arc<AggregateCounters>,
    ) -> Self {
        Self {
            client,
            counters,
            store: SnapshotStore::new(),
        }
    }

    pub fn counters(&self) -> Arc<AggregateCounters> {
        Arc::clone(&self.counters)
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub async fn refresh(&mut self) -> Result<RefreshReport> {
        self.refresh_at(Utc::now()).await
    }

    /// Runs one cycle that started at `cycle_start`.
    ///
    /// `cycle_start`, truncated to whole seconds, becomes the skip watermark
    /// for the next cycle, so a library modified while this cycle is walking
    /// is walked again next time. Library timestamps only carry seconds. On
    /// error nothing is committed and no counter moves.
    pub async fn refresh_at(
        &mut self,
        cycle_start: DateTime<Utc>,
    ) -> Result<RefreshReport> {
        let cycle_start = cycle_start.trunc_subsecs(0);
        let clock = Instant::now();
        self.store.begin_cycle();

        let libraries = self.client.list_libraries().await?;
        let flattener = TreeFlattener::new(self.client.as_ref());
        let mut fresh = Vec::new();
        let mut walked_sections = 0usize;

        for section in &libraries {
            if self.store.can_skip(section) {
                debug!(
                    target: "refresh::walk",
                    section = %section.key,
                    title = %section.title,
                    "library unchanged since last refresh; skipping"
                );
                self.store.mark_skipped(&section.key);
                continue;
            }

            let items = flattener.flatten_section(section).await?;
            debug!(
                target: "refresh::walk",
                section = %section.key,
                title = %section.title,
                items = items.len(),
                "library walked"
            );
            fresh.extend(items);
            walked_sections += 1;
        }

        // No await past this point: a cycle dropped by a deadline either
        // commits fully or not at all.
        let outcome =
            reconcile(self.store.items(), fresh, self.store.skipped_section_keys());
        for delta in &outcome.deltas {
            self.counters.apply(delta);
        }

        let mut skipped_sections: Vec<String> =
            self.store.skipped_section_keys().iter().cloned().collect();
        skipped_sections.sort();

        let report = RefreshReport {
            started_at: cycle_start,
            elapsed_ms: u64::try_from(clock.elapsed().as_millis())
                .unwrap_or(u64::MAX),
            tracked: outcome.items.len(),
            added: outcome.added,
            updated: outcome.updated,
            removed: outcome.removed,
            retained: outcome.retained,
            duplicates: outcome.duplicates,
            walked_sections,
            skipped_sections,
        };
        self.store.commit(outcome.items, cycle_start);

        info!(
            target: "refresh::summary",
            tracked = report.tracked,
            added = report.added,
            updated = report.updated,
            removed = report.removed,
            retained = report.retained,
            duplicates = report.duplicates,
            walked_sections = report.walked_sections,
            skipped_sections = report.skipped_sections.len(),
            elapsed_ms = report.elapsed_ms,
            "collection of {} media items finished",
            report.tracked
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{CatalogError, MockCatalogClient},
        error::RefreshError,
    };
    use chrono::TimeZone;
    use plexstat_model::{
        CatalogNode, ContainerNode, LibrarySection, MediaPart, MediaType,
        MediaVariant,
    };

    fn item(id: i64, section: &str, codec: &str, size: u64) -> MediaItem {
        MediaItem {
            id,
            section_key: section.into(),
            media_type: MediaType::Movie,
            parent_rating_key: None,
            grandparent_rating_key: None,
            audio_channels: 2,
            audio_codec: codec.into(),
            video_codec: "h264".into(),
            video_resolution: "1080".into(),
            size_bytes: size,
        }
    }

    fn keyed(items: &[MediaItem]) -> HashMap<i64, MediaItem> {
        items.iter().map(|i| (i.id, i.clone())).collect()
    }

    #[test]
    fn diff_classifies_added_updated_unchanged_removed() {
        let previous = keyed(&[
            item(1, "1", "aac", 100),
            item(2, "1", "aac", 100),
            item(3, "1", "aac", 100),
        ]);
        let fresh = vec![
            item(1, "1", "aac", 999),
            item(2, "1", "ac3", 100),
            item(4, "1", "aac", 50),
        ];

        let outcome = reconcile(&previous, fresh, &HashSet::new());

        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.retained, 0);
        assert_eq!(outcome.items.len(), 3);
        // size-only change is stored but produces no delta
        assert_eq!(outcome.items[&1].size_bytes, 999);
        assert_eq!(
            outcome.deltas,
            vec![
                CounterDelta::remove(&item(2, "1", "aac", 100)),
                CounterDelta::add(&item(2, "1", "ac3", 100)),
                CounterDelta::add(&item(4, "1", "aac", 50)),
                CounterDelta::remove(&item(3, "1", "aac", 100)),
            ]
        );
    }

    #[test]
    fn diff_retains_residuals_of_skipped_sections() {
        let previous = keyed(&[item(1, "1", "aac", 10), item(2, "2", "aac", 20)]);
        let skipped = HashSet::from(["2".to_string()]);

        let outcome = reconcile(&previous, vec![], &skipped);

        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.retained, 1);
        assert!(outcome.items.contains_key(&2));
        assert_eq!(outcome.deltas, vec![CounterDelta::remove(&item(1, "1", "aac", 10))]);
    }

    #[test]
    fn diff_keeps_first_duplicate() {
        let fresh = vec![item(7, "1", "aac", 10), item(7, "1", "opus", 10)];
        let outcome = reconcile(&HashMap::new(), fresh, &HashSet::new());

        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.items[&7].audio_codec, "aac");
        assert_eq!(outcome.deltas.len(), 1);
    }

    fn section(key: &str, updated_at: i64) -> LibrarySection {
        LibrarySection {
            key: key.into(),
            title: format!("Library {key}"),
            kind: "movie".into(),
            updated_at: Some(Utc.timestamp_opt(updated_at, 0).unwrap()),
        }
    }

    fn movies(section: &str, ids: &[i64]) -> ContainerNode {
        ContainerNode {
            library_section_id: Some(section.into()),
            nodes: ids
                .iter()
                .map(|id| CatalogNode {
                    node_type: "movie".into(),
                    rating_key: format!("r{id}"),
                    title: format!("Movie {id}"),
                    parent_rating_key: None,
                    grandparent_rating_key: None,
                    media: vec![MediaVariant {
                        id: *id,
                        deleted_at: None,
                        audio_channels: 2,
                        audio_codec: "aac".into(),
                        video_codec: "h264".into(),
                        video_resolution: "1080".into(),
                        parts: vec![MediaPart { size: 100 }],
                    }],
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn skipped_library_content_is_never_requested() {
        let mut client = MockCatalogClient::new();
        client
            .expect_list_libraries()
            .returning(|| Ok(vec![section("1", 1_000), section("2", 5_000)]));
        client
            .expect_fetch_library_content()
            .withf(|key| key == "1")
            .times(1)
            .returning(|_| Ok(movies("1", &[1, 2])));
        client
            .expect_fetch_library_content()
            .withf(|key| key == "2")
            .times(2)
            .returning(|_| Ok(movies("2", &[3])));

        let counters = Arc::new(AggregateCounters::new());
        let mut reconciler = Reconciler::new(Arc::new(client), counters.clone());

        let first = reconciler
            .refresh_at(Utc.timestamp_opt(2_000, 0).unwrap())
            .await
            .unwrap();
        assert_eq!(first.added, 3);
        assert!(first.skipped_sections.is_empty());

        // library 1 last changed at 1_000 < 2_000; library 2 at 5_000 >= 2_000
        let second = reconciler
            .refresh_at(Utc.timestamp_opt(3_000, 0).unwrap())
            .await
            .unwrap();
        assert!(second.is_noop());
        assert_eq!(second.skipped_sections, vec!["1".to_string()]);
        assert_eq!(second.retained, 2);
        assert_eq!(second.tracked, 3);
        assert_eq!(counters.total().items, 3);
    }

    #[tokio::test]
    async fn failed_children_fetch_leaves_state_untouched() {
        let mut client = MockCatalogClient::new();
        client
            .expect_list_libraries()
            .returning(|| Ok(vec![section("1", 1_000)]));
        client.expect_fetch_library_content().returning(|_| {
            Ok(ContainerNode {
                library_section_id: Some("1".into()),
                nodes: vec![CatalogNode {
                    node_type: "show".into(),
                    rating_key: "50".into(),
                    title: "Show".into(),
                    parent_rating_key: None,
                    grandparent_rating_key: None,
                    media: vec![],
                }],
            })
        });
        client.expect_fetch_children().returning(|key| {
            Err(CatalogError::Status {
                status: 500,
                url: format!("/library/metadata/{key}/children"),
            })
        });

        let counters = Arc::new(AggregateCounters::new());
        let mut reconciler = Reconciler::new(Arc::new(client), counters.clone());

        let err = reconciler.refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::Catalog(CatalogError::Status { status: 500, .. })));
        assert!(reconciler.store().is_empty());
        assert_eq!(reconciler.store().last_refresh(), None);
        assert!(counters.snapshot().is_empty());
    }
}
