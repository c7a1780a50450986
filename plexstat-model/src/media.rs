use crate::{labels::MediaLabels, media_type::MediaType};

/// One physical media variant of a playable catalog entry.
///
/// Items are never mutated after construction; a change observed in a later
/// refresh replaces the record stored under the same `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub id: i64,
    pub section_key: String,
    pub media_type: MediaType,
    pub parent_rating_key: Option<String>,
    pub grandparent_rating_key: Option<String>,
    pub audio_channels: u32,
    pub audio_codec: String,
    pub video_codec: String,
    pub video_resolution: String,
    pub size_bytes: u64,
}

impl MediaItem {
    pub fn labels(&self) -> MediaLabels {
        MediaLabels {
            audio_channels: self.audio_channels,
            audio_codec: self.audio_codec.clone(),
            media_type: self.media_type,
            video_codec: self.video_codec.clone(),
            video_resolution: self.video_resolution.clone(),
        }
    }

    /// Whether any tracked field differs from `other`.
    ///
    /// Only audio channels, audio codec, video codec and video resolution
    /// count. Size and hierarchy keys never mark an item as changed.
    pub fn tracked_fields_differ(&self, other: &MediaItem) -> bool {
        self.audio_channels != other.audio_channels
            || self.audio_codec != other.audio_codec
            || self.video_codec != other.video_codec
            || self.video_resolution != other.video_resolution
    }

    /// Size as a signed delta for counter arithmetic, saturating at `i64::MAX`.
    pub fn size_delta(&self) -> i64 {
        i64::try_from(self.size_bytes).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> MediaItem {
        MediaItem {
            id: 1,
            section_key: "1".into(),
            media_type: MediaType::Movie,
            parent_rating_key: None,
            grandparent_rating_key: None,
            audio_channels: 4,
            audio_codec: "aac".into(),
            video_codec: "h264".into(),
            video_resolution: "1080".into(),
            size_bytes: 1_000,
        }
    }

    #[test]
    fn size_and_hierarchy_changes_are_not_tracked() {
        let before = item();
        let after = MediaItem {
            size_bytes: 2_000,
            parent_rating_key: Some("10".into()),
            section_key: "2".into(),
            ..before.clone()
        };
        assert!(!after.tracked_fields_differ(&before));
    }

    #[test]
    fn each_tracked_field_marks_a_change() {
        let before = item();
        let variants = [
            MediaItem { audio_channels: 6, ..before.clone() },
            MediaItem { audio_codec: "ac3".into(), ..before.clone() },
            MediaItem { video_codec: "hevc".into(), ..before.clone() },
            MediaItem { video_resolution: "4k".into(), ..before.clone() },
        ];
        for after in variants {
            assert!(after.tracked_fields_differ(&before), "{after:?}");
        }
    }
}
