use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use plexstat_model::{LibrarySection, MediaItem};

/// The reconciler's memory between cycles.
///
/// Holds the items tracked after the last successful cycle, the time that
/// cycle started, and the sections skipped by the cycle in progress.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    items: HashMap<i64, MediaItem>,
    last_refresh: Option<DateTime<Utc>>,
    skipped_section_keys: HashSet<String>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &HashMap<i64, MediaItem> {
        &self.items
    }

    pub fn get(&self, id: i64) -> Option<&MediaItem> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Start time of the last committed cycle.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    pub fn skipped_section_keys(&self) -> &HashSet<String> {
        &self.skipped_section_keys
    }

    /// Forgets the previous cycle's skip decisions.
    pub fn begin_cycle(&mut self) {
        self.skipped_section_keys.clear();
    }

    /// Whether `section` can be left unwalked this cycle.
    ///
    /// Nothing is skipped before the first committed cycle.
    pub fn can_skip(&self, section: &LibrarySection) -> bool {
        self.last_refresh
            .is_some_and(|last_refresh| section.unchanged_since(last_refresh))
    }

    pub fn mark_skipped(&mut self, section_key: &str) {
        self.skipped_section_keys.insert(section_key.to_string());
    }

    /// Replaces the tracked items and advances the refresh watermark to the
    /// start of the committed cycle.
    pub fn commit(&mut self, items: HashMap<i64, MediaItem>, cycle_start: DateTime<Utc>) {
        self.items = items;
        self.last_refresh = Some(cycle_start);
    }
}
