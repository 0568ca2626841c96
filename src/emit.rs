//! Directory + queue event stream for one gallery.

use serde::Serialize;
use tracing::warn;

use crate::site::{is_network_url, Gallery, GalleryMetadata, ImageInfo, ImageReference};

/// A queued image: the fetchable URL plus everything known about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueItem {
    pub url: String,
    /// 1-based position among the emitted images.
    pub num: usize,
    #[serde(flatten)]
    pub metadata: GalleryMetadata,
    #[serde(flatten)]
    pub image: Option<ImageInfo>,
}

/// Output event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Message {
    /// Gallery metadata, exactly once and first.
    Directory(GalleryMetadata),
    Queue(QueueItem),
}

impl Message {
    pub fn as_queue(&self) -> Option<&QueueItem> {
        match self {
            Self::Queue(item) => Some(item),
            Self::Directory(_) => None,
        }
    }
}

/// Normalize every reference, then emit the directory event followed by one
/// queue event per surviving image.
///
/// References that fail to normalize are logged and skipped; `count` and
/// `num` only cover the images actually emitted.
pub fn emit(
    gallery: &dyn Gallery,
    mut metadata: GalleryMetadata,
    references: Vec<ImageReference>,
) -> Vec<Message> {
    let resolved: Vec<(String, Option<ImageInfo>)> = references
        .into_iter()
        .filter_map(|reference| match gallery.normalize(&reference.raw) {
            Ok(url) if is_network_url(&url) => Some((url, reference.info)),
            Ok(url) => {
                warn!(reference = %reference.raw, normalized = %url, "Skipping non-network image URL");
                None
            }
            Err(e) => {
                warn!(reference = %reference.raw, error = %e, "Failed to process image URL");
                None
            }
        })
        .collect();

    metadata.count = resolved.len();

    let mut messages = Vec::with_capacity(resolved.len() + 1);
    messages.push(Message::Directory(metadata.clone()));
    messages.extend(
        resolved
            .into_iter()
            .enumerate()
            .map(|(i, (url, image))| {
                Message::Queue(QueueItem {
                    url,
                    num: i + 1,
                    metadata: metadata.clone(),
                    image,
                })
            }),
    );
    messages
}
