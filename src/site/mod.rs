//! Site-specific gallery extraction.
//!
//! Each supported site gets one [`GalleryExtractor`]. The extractor turns a
//! URL into a located [`Gallery`], which knows which page to fetch, how to
//! read metadata off it and how to find and normalize its images.
//!
//! # Architecture
//!
//! - [`GalleryExtractor`]: URL matching and parameter capture (the locator)
//! - [`Gallery`]: per-gallery parsing over the fetched page text
//! - [`GalleryRouter`]: dispatches URLs and drives fetch → classify → parse → emit
//!
//! # Example
//!
//! ```rust,no_run
//! use galx::config::Config;
//! use galx::site::GalleryRouter;
//! use galx::AcceleratedClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = AcceleratedClient::new()?;
//! let router = GalleryRouter::new();
//!
//! let messages = router
//!     .extract("https://urlgalleries.net/b/blog/gallery-12345/title", &client, &Config::default())
//!     .await?;
//! println!("{} events", messages.len());
//! # Ok(())
//! # }
//! ```

pub mod urlgalleries;
pub mod wikifeet;

use std::fmt::Debug;

use serde::Serialize;
use tracing::debug;

use crate::classify::{classify, FetchPolicy};
use crate::config::{Config, SiteDefaults};
use crate::emit::{emit, Message};
use crate::error::{GalleryError, NormalizeError, Result};
use crate::http_client::{PageFetcher, PageRequest};

/// Gallery-level metadata shared by the directory event and every queue event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryMetadata {
    pub category: &'static str,
    /// Number of images emitted for this gallery.
    pub count: usize,
    #[serde(flatten)]
    pub fields: SiteFields,
}

impl GalleryMetadata {
    pub fn new(category: &'static str, fields: SiteFields) -> Self {
        Self {
            category,
            count: 0,
            fields,
        }
    }
}

/// Site-specific metadata block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SiteFields {
    Urlgalleries(urlgalleries::Fields),
    Wikifeet(wikifeet::Fields),
}

/// Per-image attributes available when the page lists images as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub pid: String,
    pub width: u64,
    pub height: u64,
    pub tags: Vec<&'static str>,
}

/// An image reference as found on the page, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub raw: String,
    pub info: Option<ImageInfo>,
}

impl ImageReference {
    pub fn bare(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            info: None,
        }
    }
}

/// A located gallery: everything derived from the input URL.
pub trait Gallery: Send + Sync + Debug {
    /// Output category (may differ from the extractor name for site variants).
    fn category(&self) -> &'static str;

    /// The single page fetched for this gallery.
    fn page_url(&self) -> String;

    /// How the page is fetched and how error responses are read.
    fn fetch_policy(&self) -> FetchPolicy;

    /// Locator parameters, for display.
    fn params(&self) -> Vec<(&'static str, String)>;

    /// Parse the metadata record. Never fails; missing fields stay empty.
    fn metadata(&self, page: &str) -> GalleryMetadata;

    /// Raw image references in page order, already filtered to network URLs.
    fn images(&self, page: &str) -> Vec<ImageReference>;

    /// Rewrite one reference into a directly fetchable URL.
    fn normalize(&self, reference: &str) -> std::result::Result<String, NormalizeError> {
        Ok(reference.to_string())
    }
}

/// Locator for one site.
pub trait GalleryExtractor: Send + Sync {
    /// Extractor name (e.g., "urlgalleries"), also the config section name.
    fn name(&self) -> &'static str;

    /// A URL this extractor accepts.
    fn example(&self) -> &'static str;

    /// Check if this extractor handles the given URL.
    fn matches(&self, url: &str) -> bool;

    /// Capture the gallery parameters from `url`.
    fn locate(&self, url: &str) -> Option<Box<dyn Gallery>>;

    /// Built-in output templates and politeness delay.
    fn defaults(&self) -> SiteDefaults;
}

/// One step of an ordered fallback chain.
pub struct Strategy<T> {
    pub name: &'static str,
    pub run: fn(&str) -> Option<Vec<T>>,
}

/// Try each strategy in order; the first non-empty result wins.
pub fn run_chain<T>(page: &str, chain: &[Strategy<T>]) -> Vec<T> {
    for strategy in chain {
        match (strategy.run)(page) {
            Some(found) if !found.is_empty() => {
                debug!(strategy = strategy.name, count = found.len(), "Strategy matched");
                return found;
            }
            _ => debug!(strategy = strategy.name, "Strategy found nothing"),
        }
    }
    Vec::new()
}

/// `true` for `http://` and `https://` references.
pub fn is_network_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Drop empty and non-network references.
pub fn retain_network_urls(references: &mut Vec<ImageReference>) {
    references.retain(|r| !r.raw.is_empty() && is_network_url(&r.raw));
}

/// Routes URLs to gallery extractors.
///
/// Extractors are checked in registration order. First match wins.
pub struct GalleryRouter {
    extractors: Vec<Box<dyn GalleryExtractor>>,
}

impl GalleryRouter {
    /// Create a router with all available extractors.
    #[must_use]
    pub fn new() -> Self {
        let extractors: Vec<Box<dyn GalleryExtractor>> = vec![
            Box::new(urlgalleries::UrlgalleriesExtractor),
            Box::new(wikifeet::WikifeetExtractor),
        ];

        Self { extractors }
    }

    /// Registered extractors, in match order.
    pub fn extractors(&self) -> impl Iterator<Item = &dyn GalleryExtractor> {
        self.extractors.iter().map(|e| &**e)
    }

    /// Find the extractor for `url` and locate the gallery.
    pub fn locate(&self, url: &str) -> Option<(&dyn GalleryExtractor, Box<dyn Gallery>)> {
        self.extractors().find(|e| e.matches(url)).and_then(|e| {
            debug!("Matched gallery extractor: {}", e.name());
            e.locate(url).map(|gallery| (e, gallery))
        })
    }

    /// Fetch and extract one gallery.
    ///
    /// Returns the directory event followed by one queue event per image.
    pub async fn extract(
        &self,
        url: &str,
        fetcher: &dyn PageFetcher,
        config: &Config,
    ) -> Result<Vec<Message>> {
        let (extractor, gallery) = self
            .locate(url)
            .ok_or_else(|| GalleryError::Unsupported(url.to_string()))?;
        let settings = config.site(extractor.name(), extractor.defaults());
        extract_gallery(gallery.as_ref(), fetcher, settings.request_interval).await
    }
}

impl Default for GalleryRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch → classify → parse → emit for an already located gallery.
pub async fn extract_gallery(
    gallery: &dyn Gallery,
    fetcher: &dyn PageFetcher,
    interval: Option<crate::config::RequestInterval>,
) -> Result<Vec<Message>> {
    let policy = gallery.fetch_policy();
    let page_url = gallery.page_url();
    let request = PageRequest {
        url: &page_url,
        follow_redirects: policy.follow_redirects,
        interval,
    };

    let page = fetcher.fetch_page(&request).await?;
    classify(&page, &policy)?;

    let references = gallery.images(&page.body);
    let metadata = gallery.metadata(&page.body);
    Ok(emit(gallery, metadata, references))
}
