//! `galx` - Gallery page extractor
//!
//! # Features
//!
//! - **Locators**: URL patterns for each supported gallery site
//! - **Metadata**: cursor-based field scripts over raw page text
//! - **Images**: ordered fallback chains plus legacy-host URL normalization
//! - **Events**: one directory event, then one queue event per image
//!
//! # Example
//!
//! ```rust,no_run
//! use galx::{AcceleratedClient, Config, GalleryRouter, Message};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let client = AcceleratedClient::new()?;
//!     let router = GalleryRouter::new();
//!     let messages = router
//!         .extract("https://www.wikifeet.com/Some_Celeb", &client, &Config::default())
//!         .await?;
//!     for message in &messages {
//!         if let Message::Queue(item) = message {
//!             println!("{} {}", item.num, item.url);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod emit;
pub mod error;
pub mod http_client;
pub mod output;
pub mod site;
pub mod text;

pub use classify::{classify, FetchPolicy};
pub use config::{Config, RequestInterval, SiteSettings};
pub use emit::{emit, Message, QueueItem};
pub use error::{ConfigError, GalleryError, NormalizeError, Result};
pub use http_client::{AcceleratedClient, FetchedPage, PageFetcher, PageRequest};
pub use site::{
    extract_gallery, Gallery, GalleryExtractor, GalleryMetadata, GalleryRouter, ImageInfo,
    ImageReference, SiteFields,
};

/// Version of galx
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
