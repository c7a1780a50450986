use std::fmt;

use crate::media_type::MediaType;

/// Label names in exposition order.
pub const LABEL_NAMES: [&str; 5] = [
    "audio_channels",
    "audio_codec",
    "media_type",
    "video_codec",
    "video_resolution",
];

/// The label partition an item is aggregated under.
///
/// Ordering follows [`LABEL_NAMES`] so sorted collections render in a stable
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaLabels {
    pub audio_channels: u32,
    pub audio_codec: String,
    pub media_type: MediaType,
    pub video_codec: String,
    pub video_resolution: String,
}

impl MediaLabels {
    /// Label values paired with their names, in [`LABEL_NAMES`] order.
    pub fn pairs(&self) -> [(&'static str, String); 5] {
        [
            (LABEL_NAMES[0], self.audio_channels.to_string()),
            (LABEL_NAMES[1], self.audio_codec.clone()),
            (LABEL_NAMES[2], self.media_type.as_str().to_string()),
            (LABEL_NAMES[3], self.video_codec.clone()),
            (LABEL_NAMES[4], self.video_resolution.clone()),
        ]
    }
}

impl fmt::Display for MediaLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}ch {}/{}@{}",
            self.media_type,
            self.audio_channels,
            self.audio_codec,
            self.video_codec,
            self.video_resolution
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_follow_label_name_order() {
        let labels = MediaLabels {
            audio_channels: 6,
            audio_codec: "eac3".into(),
            media_type: MediaType::Episode,
            video_codec: "hevc".into(),
            video_resolution: "4k".into(),
        };

        let names: Vec<_> = labels.pairs().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, LABEL_NAMES);
        assert_eq!(labels.pairs()[0].1, "6");
        assert_eq!(labels.pairs()[2].1, "episode");
    }

    #[test]
    fn ordering_is_stable_by_channel_first() {
        let mut a = MediaLabels {
            audio_channels: 2,
            audio_codec: "aac".into(),
            media_type: MediaType::Movie,
            video_codec: "h264".into(),
            video_resolution: "1080".into(),
        };
        let b = MediaLabels {
            audio_channels: 6,
            ..a.clone()
        };
        assert!(a < b);

        a.audio_channels = 8;
        assert!(a > b);
    }
}
