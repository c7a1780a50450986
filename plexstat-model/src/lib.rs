//! Core data model definitions shared across plexstat crates.
#![allow(missing_docs)]

pub mod catalog;
pub mod labels;
pub mod media;
pub mod media_type;

// Intentionally curated re-exports for downstream consumers.
pub use catalog::{
    CatalogNode, ContainerNode, LibrarySection, MediaPart, MediaVariant,
    ServerIdentity,
};
pub use labels::{LABEL_NAMES, MediaLabels};
pub use media::MediaItem;
pub use media_type::MediaType;
