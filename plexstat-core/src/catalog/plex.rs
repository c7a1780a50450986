use std::{fmt, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plexstat_model::{
    CatalogNode, ContainerNode, LibrarySection, MediaPart, MediaVariant,
    ServerIdentity,
};
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{CatalogClient, CatalogError};

const PRODUCT: &str = "plexstat";
const CLIENT_IDENTIFIER: &str = "plexstat-collector";

const PLEX_TOKEN: HeaderName = HeaderName::from_static("x-plex-token");
const PLEX_PRODUCT: HeaderName = HeaderName::from_static("x-plex-product");
const PLEX_CLIENT_ID: HeaderName =
    HeaderName::from_static("x-plex-client-identifier");

/// Plex Media Server catalog client over its JSON HTTP API.
pub struct PlexClient {
    http: reqwest::Client,
    base_url: Url,
}

impl fmt::Debug for PlexClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlexClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl PlexClient {
    pub fn new(
        base_url: Url,
        token: &str,
        request_timeout: Duration,
    ) -> Result<Self, CatalogError> {
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidBaseUrl(base_url.to_string()));
        }

        let mut token_value = HeaderValue::from_str(token)
            .map_err(|err| CatalogError::InvalidToken(err.to_string()))?;
        token_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(PLEX_TOKEN, token_value);
        headers.insert(PLEX_PRODUCT, HeaderValue::from_static(PRODUCT));
        headers.insert(
            PLEX_CLIENT_ID,
            HeaderValue::from_static(CLIENT_IDENTIFIER),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
    {
        debug!(target: "catalog::plex", url = %url, "GET");
        let response = self.http.get(url.clone()).send().await?;

        let status = response.status();
        if status.is_success() {
            let body = response.bytes().await?;
            return serde_json::from_slice(&body).map_err(|err| {
                CatalogError::Decode {
                    url: url.to_string(),
                    message: err.to_string(),
                }
            });
        }

        match status.as_u16() {
            401 => Err(CatalogError::Unauthorized),
            404 => Err(CatalogError::NotFound(url.path().to_string())),
            code => Err(CatalogError::Status {
                status: code,
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl CatalogClient for PlexClient {
    async fn ping(&self) -> Result<ServerIdentity, CatalogError> {
        let url = self.endpoint(&["identity"])?;
        let envelope: Envelope<IdentityDto> = self.get_json(url).await?;
        Ok(envelope.media_container.into())
    }

    async fn list_libraries(&self) -> Result<Vec<LibrarySection>, CatalogError> {
        let url = self.endpoint(&["library", "sections"])?;
        let envelope: Envelope<SectionsDto> = self.get_json(url).await?;
        Ok(envelope
            .media_container
            .directory
            .into_iter()
            .map(LibrarySection::from)
            .collect())
    }

    async fn fetch_library_content(
        &self,
        section_key: &str,
    ) -> Result<ContainerNode, CatalogError> {
        let url = self.endpoint(&["library", "sections", section_key, "all"])?;
        let envelope: Envelope<MetadataContainerDto> =
            self.get_json(url).await?;
        Ok(envelope.media_container.into())
    }

    async fn fetch_children(
        &self,
        rating_key: &str,
    ) -> Result<ContainerNode, CatalogError> {
        let url =
            self.endpoint(&["library", "metadata", rating_key, "children"])?;
        let envelope: Envelope<MetadataContainerDto> =
            self.get_json(url).await?;
        Ok(envelope.media_container.into())
    }
}

// Wire format. Plex is inconsistent about numeric vs string identifiers
// across versions, so keys accept either.

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyDto {
    Number(i64),
    Text(String),
}

impl fmt::Display for KeyDto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyDto::Number(n) => write!(f, "{n}"),
            KeyDto::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityDto {
    #[serde(default)]
    machine_identifier: String,
    #[serde(default)]
    version: String,
}

impl From<IdentityDto> for ServerIdentity {
    fn from(dto: IdentityDto) -> Self {
        ServerIdentity {
            machine_identifier: dto.machine_identifier,
            version: dto.version,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SectionsDto {
    #[serde(rename = "Directory", default)]
    directory: Vec<DirectoryDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryDto {
    key: KeyDto,
    #[serde(default)]
    title: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    updated_at: Option<i64>,
}

impl From<DirectoryDto> for LibrarySection {
    fn from(dto: DirectoryDto) -> Self {
        LibrarySection {
            key: dto.key.to_string(),
            title: dto.title,
            kind: dto.kind,
            updated_at: dto
                .updated_at
                .filter(|secs| *secs > 0)
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetadataContainerDto {
    #[serde(rename = "librarySectionID", default)]
    library_section_id: Option<KeyDto>,
    #[serde(rename = "Metadata", default)]
    metadata: Vec<MetadataDto>,
}

impl From<MetadataContainerDto> for ContainerNode {
    fn from(dto: MetadataContainerDto) -> Self {
        ContainerNode {
            library_section_id: dto.library_section_id.map(|k| k.to_string()),
            nodes: dto.metadata.into_iter().map(CatalogNode::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataDto {
    #[serde(rename = "type", default)]
    node_type: String,
    rating_key: KeyDto,
    #[serde(default)]
    title: String,
    #[serde(default)]
    parent_rating_key: Option<KeyDto>,
    #[serde(default)]
    grandparent_rating_key: Option<KeyDto>,
    #[serde(rename = "Media", default)]
    media: Vec<MediaDto>,
}

impl From<MetadataDto> for CatalogNode {
    fn from(dto: MetadataDto) -> Self {
        CatalogNode {
            node_type: dto.node_type,
            rating_key: dto.rating_key.to_string(),
            title: dto.title,
            parent_rating_key: dto.parent_rating_key.map(|k| k.to_string()),
            grandparent_rating_key: dto
                .grandparent_rating_key
                .map(|k| k.to_string()),
            media: dto.media.into_iter().map(MediaVariant::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaDto {
    id: i64,
    #[serde(default)]
    deleted_at: Option<i64>,
    #[serde(default)]
    audio_channels: Option<u32>,
    #[serde(default)]
    audio_codec: Option<String>,
    #[serde(default)]
    video_codec: Option<String>,
    #[serde(default)]
    video_resolution: Option<String>,
    #[serde(rename = "Part", default)]
    parts: Vec<PartDto>,
}

impl From<MediaDto> for MediaVariant {
    fn from(dto: MediaDto) -> Self {
        MediaVariant {
            id: dto.id,
            deleted_at: dto.deleted_at,
            audio_channels: dto.audio_channels.unwrap_or_default(),
            audio_codec: dto.audio_codec.unwrap_or_default(),
            video_codec: dto.video_codec.unwrap_or_default(),
            video_resolution: dto.video_resolution.unwrap_or_default(),
            parts: dto
                .parts
                .into_iter()
                .map(|part| MediaPart {
                    size: part.size.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PartDto {
    #[serde(default)]
    size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let client = PlexClient::new(
            Url::parse("http://plex.local:32400/proxy/").unwrap(),
            "token",
            Duration::from_secs(5),
        )
        .unwrap();

        let url = client
            .endpoint(&["library", "metadata", "42", "children"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://plex.local:32400/proxy/library/metadata/42/children"
        );
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let err = PlexClient::new(
            Url::parse("http://plex.local:32400").unwrap(),
            "abc\ndef",
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidToken(_)));
    }

    #[test]
    fn decodes_sections_listing() {
        let raw = r#"{"MediaContainer":{"size":2,"Directory":[
            {"key":"1","title":"Movies","type":"movie","updatedAt":1700000000},
            {"key":2,"title":"Music","type":"artist"}
        ]}}"#;
        let envelope: Envelope<SectionsDto> = serde_json::from_str(raw).unwrap();
        let sections: Vec<LibrarySection> = envelope
            .media_container
            .directory
            .into_iter()
            .map(LibrarySection::from)
            .collect();

        assert_eq!(sections[0].key, "1");
        assert_eq!(
            sections[0].updated_at,
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0)
        );
        assert_eq!(sections[1].key, "2");
        assert_eq!(sections[1].updated_at, None);
    }

    #[test]
    fn decodes_metadata_with_media_and_parts() {
        let raw = r#"{"MediaContainer":{"librarySectionID":3,"Metadata":[
            {"ratingKey":"101","type":"episode","title":"Pilot",
             "parentRatingKey":"100","grandparentRatingKey":"99",
             "Media":[{"id":555,"audioChannels":6,"audioCodec":"eac3",
                       "videoCodec":"hevc","videoResolution":"4k",
                       "Part":[{"size":1000},{"size":24}]}]},
            {"ratingKey":"102","type":"season","title":"Season 2"}
        ]}}"#;
        let envelope: Envelope<MetadataContainerDto> =
            serde_json::from_str(raw).unwrap();
        let container = ContainerNode::from(envelope.media_container);

        assert_eq!(container.library_section_id.as_deref(), Some("3"));
        assert_eq!(container.nodes.len(), 2);

        let episode = &container.nodes[0];
        assert_eq!(episode.parent_rating_key.as_deref(), Some("100"));
        assert_eq!(episode.grandparent_rating_key.as_deref(), Some("99"));
        assert_eq!(episode.media[0].id, 555);
        assert_eq!(episode.media[0].total_size(), 1_024);
        assert!(container.nodes[1].media.is_empty());
    }
}
