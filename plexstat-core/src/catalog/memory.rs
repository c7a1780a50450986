use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use plexstat_model::{ContainerNode, LibrarySection, ServerIdentity};

use super::{CatalogClient, CatalogError};

/// Catalog held entirely in memory.
///
/// Mutable through `&self` so a test can share it with a reconciler and
/// reshape the catalog between refresh cycles. Every content and children
/// fetch is recorded, and keys can be made to fail on demand.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
    fetches: Mutex<Vec<String>>,
}

#[derive(Debug, Default)]
struct CatalogState {
    libraries: Vec<LibrarySection>,
    contents: HashMap<String, ContainerNode>,
    children: HashMap<String, ContainerNode>,
    failing: HashSet<String>,
    unreachable: bool,
    latency: Option<Duration>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a library and its top-level content.
    pub fn put_library(&self, section: LibrarySection, content: ContainerNode) {
        let mut state = self.state.write();
        state.contents.insert(section.key.clone(), content);
        match state.libraries.iter_mut().find(|s| s.key == section.key) {
            Some(existing) => *existing = section,
            None => state.libraries.push(section),
        }
    }

    /// Replaces a library's content without touching its timestamp.
    pub fn put_content(&self, section_key: &str, content: ContainerNode) {
        self.state
            .write()
            .contents
            .insert(section_key.to_string(), content);
    }

    pub fn put_children(&self, rating_key: &str, children: ContainerNode) {
        self.state
            .write()
            .children
            .insert(rating_key.to_string(), children);
    }

    pub fn remove_library(&self, section_key: &str) {
        let mut state = self.state.write();
        state.libraries.retain(|s| s.key != section_key);
        state.contents.remove(section_key);
    }

    /// Moves a library's reported modification time.
    pub fn touch_library(&self, section_key: &str, at: DateTime<Utc>) {
        let mut state = self.state.write();
        if let Some(section) =
            state.libraries.iter_mut().find(|s| s.key == section_key)
        {
            section.updated_at = Some(at);
        }
    }

    /// Makes content or children fetches for `key` fail until cleared.
    pub fn fail_on(&self, key: &str) {
        self.state.write().failing.insert(key.to_string());
    }

    pub fn clear_failures(&self) {
        self.state.write().failing.clear();
    }

    /// Makes every request fail, including [`CatalogClient::ping`].
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.write().unreachable = unreachable;
    }

    /// Delay applied to the library listing, to simulate a slow server.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().latency = latency;
    }

    /// Keys of every content and children fetch, in request order.
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }

    pub fn clear_fetches(&self) {
        self.fetches.lock().clear();
    }

    fn check(&self, key: &str) -> Result<(), CatalogError> {
        let state = self.state.read();
        if state.unreachable || state.failing.contains(key) {
            return Err(CatalogError::Status {
                status: 503,
                url: format!("memory://{key}"),
            });
        }
        Ok(())
    }

    fn lookup(
        &self,
        key: &str,
        select: impl Fn(&CatalogState) -> Option<ContainerNode>,
    ) -> Result<ContainerNode, CatalogError> {
        self.fetches.lock().push(key.to_string());
        self.check(key)?;
        select(&self.state.read())
            .ok_or_else(|| CatalogError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn ping(&self) -> Result<ServerIdentity, CatalogError> {
        self.check("identity")?;
        Ok(ServerIdentity {
            machine_identifier: "in-memory".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    async fn list_libraries(&self) -> Result<Vec<LibrarySection>, CatalogError> {
        let latency = self.state.read().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.check("sections")?;
        Ok(self.state.read().libraries.clone())
    }

    async fn fetch_library_content(
        &self,
        section_key: &str,
    ) -> Result<ContainerNode, CatalogError> {
        self.lookup(section_key, |state| state.contents.get(section_key).cloned())
    }

    async fn fetch_children(
        &self,
        rating_key: &str,
    ) -> Result<ContainerNode, CatalogError> {
        self.lookup(rating_key, |state| state.children.get(rating_key).cloned())
    }
}
