use futures::future::BoxFuture;
use plexstat_model::{
    CatalogNode, ContainerNode, LibrarySection, MediaItem, MediaType,
};
use tracing::trace;

use crate::{
    catalog::CatalogClient,
    error::{RefreshError, Result},
};

/// How the flattener treats a catalog node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Music entries are not counted and never descended into.
    Music,
    /// Shows and seasons; their children are fetched and walked.
    Container,
    /// Movies and episodes; their media variants become items.
    Playable(MediaType),
}

impl NodeKind {
    /// `None` for node types the flattener does not know how to handle.
    pub fn classify(node_type: &str) -> Option<Self> {
        match node_type {
            "artist" | "album" => Some(NodeKind::Music),
            "show" | "season" => Some(NodeKind::Container),
            "movie" => Some(NodeKind::Playable(MediaType::Movie)),
            "episode" => Some(NodeKind::Playable(MediaType::Episode)),
            _ => None,
        }
    }
}

/// Depth-first walk of catalog containers into a flat, ordered item list.
///
/// Issues one children request per show or season encountered. An unknown
/// node type aborts the walk.
pub struct TreeFlattener<'a> {
    client: &'a dyn CatalogClient,
}

impl std::fmt::Debug for TreeFlattener<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeFlattener").finish_non_exhaustive()
    }
}

impl<'a> TreeFlattener<'a> {
    pub fn new(client: &'a dyn CatalogClient) -> Self {
        Self { client }
    }

    pub async fn flatten_section(
        &self,
        section: &LibrarySection,
    ) -> Result<Vec<MediaItem>> {
        let content = self.client.fetch_library_content(&section.key).await?;
        self.flatten(content, &section.key).await
    }

    /// Items reachable from `container`, in document order.
    ///
    /// Items are attributed to the section the container reports, or to
    /// `section_key` when it reports none.
    pub fn flatten<'b>(
        &'b self,
        container: ContainerNode,
        section_key: &'b str,
    ) -> BoxFuture<'b, Result<Vec<MediaItem>>> {
        Box::pin(async move {
            let section_key = container
                .library_section_id
                .unwrap_or_else(|| section_key.to_string());
            let mut items = Vec::new();

            for node in container.nodes {
                match NodeKind::classify(&node.node_type) {
                    Some(NodeKind::Music) => {
                        trace!(rating_key = %node.rating_key, "skipping music entry");
                    }
                    Some(NodeKind::Container) => {
                        let children =
                            self.client.fetch_children(&node.rating_key).await?;
                        items.extend(self.flatten(children, &section_key).await?);
                    }
                    Some(NodeKind::Playable(media_type)) => {
                        items.extend(media_items(&node, media_type, &section_key));
                    }
                    None => {
                        return Err(RefreshError::UnknownNodeType {
                            node_type: node.node_type,
                            rating_key: node.rating_key,
                        });
                    }
                }
            }

            Ok(items)
        })
    }
}

/// Items for the countable media variants of a playable node.
///
/// Deleted variants and placeholder variants are left out.
pub fn media_items(
    node: &CatalogNode,
    media_type: MediaType,
    section_key: &str,
) -> Vec<MediaItem> {
    node.media
        .iter()
        .filter(|variant| !variant.is_deleted() && !variant.is_placeholder())
        .map(|variant| MediaItem {
            id: variant.id,
            section_key: section_key.to_string(),
            media_type,
            parent_rating_key: node.parent_rating_key.clone(),
            grandparent_rating_key: node.grandparent_rating_key.clone(),
            audio_channels: variant.audio_channels,
            audio_codec: variant.audio_codec.clone(),
            video_codec: variant.video_codec.clone(),
            video_resolution: variant.video_resolution.clone(),
            size_bytes: variant.total_size(),
        })
        .collect()
}
