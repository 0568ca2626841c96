//! Response classification before any parsing runs.
//!
//! An error page parsed as a gallery would produce an empty or garbage
//! event stream, so the status and redirect target are checked first.

use crate::error::{GalleryError, Result, BODY_EXCERPT_LEN};
use crate::http_client::FetchedPage;

/// How a site's gallery page is fetched and how its errors look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Name used in the not-found error ("gallery", "celebrity").
    pub resource: &'static str,
    pub follow_redirects: bool,
    /// Suffix of the redirect target the site uses for missing content.
    pub not_found_marker: Option<&'static str>,
}

/// Gate a fetched page: `Ok` for 2xx, otherwise the matching error kind.
///
/// If the site moves its not-found page, missing galleries degrade to
/// [`GalleryError::Http`].
pub fn classify(page: &FetchedPage, policy: &FetchPolicy) -> Result<()> {
    if (200..300).contains(&page.status) {
        return Ok(());
    }

    if let (Some(marker), Some(location)) = (policy.not_found_marker, page.location.as_deref()) {
        if location.ends_with(marker) {
            return Err(GalleryError::NotFound(policy.resource));
        }
    }

    Err(GalleryError::Http {
        status: page.status,
        url: page.url.clone(),
        location: page.location.clone(),
        body_excerpt: excerpt(&page.body),
    })
}

fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}
