//! Page fetching
//!
//! Features:
//! - Brotli, Zstd, Gzip compression (auto-negotiated)
//! - TLS 1.3 via rustls, HTTP/2 when the server offers it
//! - Cookie store shared across redirects
//! - Per-request choice between following redirects and inspecting them
//! - Politeness delay drawn from the site's `request_interval`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, LOCATION, USER_AGENT};
use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::config::{Config, RequestInterval};
use crate::error::Result;

/// Default browser-like user agent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// One gallery page fetch.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub url: &'a str,
    pub follow_redirects: bool,
    /// Politeness delay applied before the request.
    pub interval: Option<RequestInterval>,
}

/// What the pipeline needs from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after any followed redirects.
    pub url: String,
    pub status: u16,
    /// `Location` header, if any.
    pub location: Option<String>,
    pub body: String,
}

/// Source of gallery pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<FetchedPage>;
}

/// HTTP client with compression, cookies and two redirect policies
pub struct AcceleratedClient {
    following: Client,
    direct: Client,
}

impl AcceleratedClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self> {
        Self::from_config(&Config::default())
    }

    /// Create a client honoring `user_agent` and `timeout_secs` from config
    pub fn from_config(config: &Config) -> Result<Self> {
        let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let timeout = Duration::from_secs(config.timeout_secs);

        Ok(Self {
            following: build_client(user_agent, timeout, reqwest::redirect::Policy::limited(10))?,
            direct: build_client(user_agent, timeout, reqwest::redirect::Policy::none())?,
        })
    }

    fn client(&self, follow_redirects: bool) -> &Client {
        if follow_redirects {
            &self.following
        } else {
            &self.direct
        }
    }
}

fn build_client(
    user_agent: &str,
    timeout: Duration,
    redirect: reqwest::redirect::Policy,
) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }

    let client = Client::builder()
        // ═══════════════════════════════════════════════════════════════
        // CONNECTIONS
        // ═══════════════════════════════════════════════════════════════
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .use_rustls_tls()
        // ═══════════════════════════════════════════════════════════════
        // COMPRESSION (auto-negotiated via Accept-Encoding)
        // ═══════════════════════════════════════════════════════════════
        .brotli(true)
        .zstd(true)
        .gzip(true)
        .deflate(true)
        .default_headers(headers)
        // ═══════════════════════════════════════════════════════════════
        // TIMEOUTS
        // ═══════════════════════════════════════════════════════════════
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .redirect(redirect)
        .cookie_store(true)
        .build()?;

    Ok(client)
}

#[async_trait]
impl PageFetcher for AcceleratedClient {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<FetchedPage> {
        if let Some(interval) = request.interval {
            let delay = interval.sample();
            debug!(
                delay_ms = delay.as_millis(),
                min = interval.min(),
                max = interval.max(),
                "Politeness delay"
            );
            tokio::time::sleep(delay).await;
        }

        let response = self
            .client(request.follow_redirects)
            .get(request.url)
            .send()
            .await?;

        info!(
            status = %response.status(),
            version = ?response.version(),
            content_encoding = ?response.headers().get("content-encoding"),
            "Response received"
        );

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(FetchedPage {
            url,
            status,
            location,
            body,
        })
    }
}
