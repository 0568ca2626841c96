//! Error types for gallery extraction.
//!
//! Terminal failures ([`GalleryError`]) abort one gallery. Per-image failures
//! ([`NormalizeError`]) are logged and the image is skipped.

use thiserror::Error;

/// Number of body bytes kept on an [`GalleryError::Http`] for diagnostics.
pub const BODY_EXCERPT_LEN: usize = 512;

/// Gallery-level errors
#[derive(Error, Debug)]
pub enum GalleryError {
    /// The site redirected to its "not found" page.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unexpected status code. The caller decides whether to retry.
    #[error("HTTP {status} for {url}")]
    Http {
        status: u16,
        url: String,
        location: Option<String>,
        body_excerpt: String,
    },

    #[error("no extractor matches {0}")]
    Unsupported(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GalleryError {
    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::NotFound(_) | Self::Unsupported(_) | Self::Config(_) => false,
        }
    }
}

/// A single image reference could not be turned into a fetchable URL.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("invalid image URL {reference:?}: {source}")]
    InvalidUrl {
        reference: String,
        #[source]
        source: url::ParseError,
    },

    #[error("image URL {0:?} has no host")]
    MissingHost(String),
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid request_interval [{0}, {1}]")]
    Interval(f64, f64),
}

pub type Result<T> = std::result::Result<T, GalleryError>;
