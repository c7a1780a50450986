//! Catalog shapes as reported by the media server, independent of wire format.

use chrono::{DateTime, Utc};

/// A library section as listed by the media server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySection {
    pub key: String,
    pub title: String,
    /// Section kind reported by the server (`movie`, `show`, `artist`, ...).
    pub kind: String,
    /// Last modification reported by the server. `None` when the server
    /// omits it, in which case the section is always walked.
    pub updated_at: Option<DateTime<Utc>>,
}

impl LibrarySection {
    /// True when the section reports no modification at or after `since`.
    pub fn unchanged_since(&self, since: DateTime<Utc>) -> bool {
        self.updated_at.is_some_and(|updated_at| updated_at < since)
    }
}

/// Identity of the media server answering catalog requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerIdentity {
    pub machine_identifier: String,
    pub version: String,
}

/// A listing of child nodes: either a section's content or a node's children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerNode {
    /// Section the listed nodes belong to, when the server reports it.
    pub library_section_id: Option<String>,
    pub nodes: Vec<CatalogNode>,
}

/// One entry of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogNode {
    /// Raw node type (`movie`, `show`, `season`, `episode`, `artist`, ...).
    pub node_type: String,
    pub rating_key: String,
    pub title: String,
    pub parent_rating_key: Option<String>,
    pub grandparent_rating_key: Option<String>,
    pub media: Vec<MediaVariant>,
}

/// A single encoding of a playable node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaVariant {
    pub id: i64,
    pub deleted_at: Option<i64>,
    pub audio_channels: u32,
    pub audio_codec: String,
    pub video_codec: String,
    pub video_resolution: String,
    pub parts: Vec<MediaPart>,
}

impl MediaVariant {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some_and(|at| at != 0)
    }

    /// Variants with neither audio channels nor a video resolution are
    /// placeholders the server keeps for unanalyzed or missing files.
    pub fn is_placeholder(&self) -> bool {
        self.audio_channels == 0 && self.video_resolution.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.parts
            .iter()
            .fold(0u64, |acc, part| acc.saturating_add(part.size))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaPart {
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn zero_deleted_at_is_not_deleted() {
        let variant = MediaVariant {
            deleted_at: Some(0),
            ..Default::default()
        };
        assert!(!variant.is_deleted());
        assert!(
            MediaVariant {
                deleted_at: Some(1_700_000_000),
                ..Default::default()
            }
            .is_deleted()
        );
    }

    #[test]
    fn placeholder_requires_both_fields_empty() {
        let mut variant = MediaVariant::default();
        assert!(variant.is_placeholder());

        variant.audio_channels = 2;
        assert!(!variant.is_placeholder());

        variant.audio_channels = 0;
        variant.video_resolution = "sd".into();
        assert!(!variant.is_placeholder());
    }

    #[test]
    fn total_size_sums_parts() {
        let variant = MediaVariant {
            parts: vec![MediaPart { size: 700 }, MediaPart { size: 300 }],
            ..Default::default()
        };
        assert_eq!(variant.total_size(), 1_000);
    }

    #[test]
    fn unchanged_since_is_strict() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let section = LibrarySection {
            key: "1".into(),
            title: "Movies".into(),
            kind: "movie".into(),
            updated_at: Some(at),
        };
        assert!(!section.unchanged_since(at));
        assert!(section.unchanged_since(at + chrono::Duration::seconds(1)));
    }

    #[test]
    fn missing_timestamp_is_never_unchanged() {
        let section = LibrarySection {
            key: "1".into(),
            title: "Movies".into(),
            kind: "movie".into(),
            updated_at: None,
        };
        assert!(!section.unchanged_since(Utc::now()));
    }
}
