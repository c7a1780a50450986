//! Access to the media server's library catalog.

mod memory;
mod plex;

pub use memory::InMemoryCatalog;
pub use plex::PlexClient;

use async_trait::async_trait;
use plexstat_model::{ContainerNode, LibrarySection, ServerIdentity};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unauthorized; check the configured token")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Read-only view of a media server catalog.
///
/// Every method performs at most one request. Traversal and recursion live
/// in [`TreeFlattener`](crate::flatten::TreeFlattener).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Connectivity and credential check.
    async fn ping(&self) -> Result<ServerIdentity, CatalogError>;

    async fn list_libraries(&self) -> Result<Vec<LibrarySection>, CatalogError>;

    /// Top-level content of a library section.
    async fn fetch_library_content(
        &self,
        section_key: &str,
    ) -> Result<ContainerNode, CatalogError>;

    /// Children of a container node such as a show or a season.
    async fn fetch_children(
        &self,
        rating_key: &str,
    ) -> Result<ContainerNode, CatalogError>;
}
