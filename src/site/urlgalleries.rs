//! urlgalleries.net galleries, with images hosted on Imagevenue.
//!
//! Gallery pages link images either through the current Imagevenue CDN or,
//! on older galleries, through thumbnails on the legacy `imgN.imagevenue.com`
//! servers. Legacy thumbnails are rewritten to the direct-image endpoint.
//!
//! # Example
//!
//! ```rust
//! use galx::site::{Gallery, GalleryExtractor, urlgalleries::UrlgalleriesExtractor};
//!
//! let gallery = UrlgalleriesExtractor
//!     .locate("https://urlgalleries.net/b/someblog/porn-gallery-12345/title")
//!     .unwrap();
//! assert_eq!(
//!     gallery.page_url(),
//!     "https://urlgalleries.net/b/someblog/porn-gallery-12345/?a=10000"
//! );
//! ```

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use url::Url;

use super::{
    retain_network_urls, run_chain, Gallery, GalleryExtractor, GalleryMetadata, ImageReference,
    SiteFields, Strategy,
};
use crate::classify::FetchPolicy;
use crate::config::{RequestInterval, SiteDefaults};
use crate::error::NormalizeError;
use crate::text::{self, scan_fields, Clean, Field};

pub const ROOT: &str = "https://urlgalleries.net";

/// Current Imagevenue CDN host. References on it are already direct.
pub const CDN_HOST: &str = "cdno-data.imagevenue.com";

/// Legacy Imagevenue domain; thumbnails live on `imgN.` subdomains.
pub const LEGACY_DOMAIN: &str = "imagevenue.com";

/// Direct-image endpoint on a legacy server.
pub const DIRECT_TEMPLATE: &str = "https://{server}.imagevenue.com/img.php?image={filename}";

/// Redirect target for removed galleries.
pub const NOT_FOUND_MARKER: &str = "/not_found_adult.php";

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)()(?:(\w+)\.)?urlgalleries\.net/(?:b/([^/?#]+)/)?(?:[\w-]+-)?(\d+)",
    )
    .unwrap()
});

/// Thumbnail naming schemes used by the legacy servers, newest first.
static THUMBNAIL_REGEXES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"/(?:loc\d+/)?th?_(\d+_.*\.(?:jpg|png|gif|webp))").unwrap(),
        Regex::new(r"/(?:loc\d+/)?img_(\d+_.*\.(?:jpg|png|gif|webp))").unwrap(),
        Regex::new(r"/(\d+_.*\.(?:jpg|png|gif|webp))").unwrap(),
    ]
});

/// Page order: site name, blog, report link, gallery title, date line.
const FIELD_SCRIPT: [Field; 5] = [
    Field::new(" title=\"", "\"", Clean::Raw),
    Field::new(" title=\"", "\"", Clean::Unescape),
    Field::new(" title=\"", "\"", Clean::Raw),
    Field::new(" title=\"", "\"", Clean::UnescapeTrim),
    Field::new(" images in gallery | ", "<", Clean::Raw),
];

const DATE_FORMAT: &str = "%B %d, %Y";

const IMAGE_CHAIN: [Strategy<String>; 2] = [
    Strategy {
        name: "imagevenue-cdn",
        run: cdn_images,
    },
    Strategy {
        name: "legacy-thumbnails",
        run: legacy_thumbnails,
    },
];

/// Metadata fields for a urlgalleries gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fields {
    pub gallery_id: String,
    pub blog: String,
    pub title: String,
    pub date: Option<NaiveDate>,
}

/// urlgalleries.net extractor.
pub struct UrlgalleriesExtractor;

impl GalleryExtractor for UrlgalleriesExtractor {
    fn name(&self) -> &'static str {
        "urlgalleries"
    }

    fn example(&self) -> &'static str {
        "https://urlgalleries.net/b/BLOG/gallery-12345/TITLE"
    }

    fn matches(&self, url: &str) -> bool {
        URL_REGEX.is_match(url)
    }

    fn locate(&self, url: &str) -> Option<Box<dyn Gallery>> {
        let caps = URL_REGEX.captures(url)?;
        let blog = caps
            .get(3)
            .filter(|m| !m.as_str().is_empty())
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let gallery_id = caps.get(4)?.as_str().to_string();

        Some(Box::new(UrlgalleriesGallery { blog, gallery_id }))
    }

    fn defaults(&self) -> SiteDefaults {
        SiteDefaults {
            request_interval: Some(RequestInterval::new(0.5, 1.5)),
            directory_fmt: &["{category}", "{blog}", "{gallery_id} {title}"],
            filename_fmt: "{num:>03}.{extension}",
            archive_fmt: Some("{gallery_id}_{num}"),
        }
    }
}

/// A located urlgalleries gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlgalleriesGallery {
    pub blog: String,
    pub gallery_id: String,
}

impl Gallery for UrlgalleriesGallery {
    fn category(&self) -> &'static str {
        "urlgalleries"
    }

    fn page_url(&self) -> String {
        format!(
            "{ROOT}/b/{}/porn-gallery-{}/?a=10000",
            self.blog, self.gallery_id
        )
    }

    fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            resource: "gallery",
            follow_redirects: false,
            not_found_marker: Some(NOT_FOUND_MARKER),
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("blog", self.blog.clone()),
            ("gallery_id", self.gallery_id.clone()),
        ]
    }

    fn metadata(&self, page: &str) -> GalleryMetadata {
        let [_site, blog, _report, title, date] = scan_fields(page, &FIELD_SCRIPT);

        GalleryMetadata::new(
            self.category(),
            SiteFields::Urlgalleries(Fields {
                gallery_id: self.gallery_id.clone(),
                blog,
                title,
                date: text::parse_date(&date, DATE_FORMAT),
            }),
        )
    }

    fn images(&self, page: &str) -> Vec<ImageReference> {
        let mut references: Vec<_> = run_chain(page, &IMAGE_CHAIN)
            .into_iter()
            .map(ImageReference::bare)
            .collect();
        retain_network_urls(&mut references);
        references
    }

    fn normalize(&self, reference: &str) -> Result<String, NormalizeError> {
        normalize_imagevenue(reference)
    }
}

/// Every `src` attribute pointing at the current CDN.
fn cdn_images(page: &str) -> Option<Vec<String>> {
    let prefix = format!("src=\"https://{CDN_HOST}/");
    let found: Vec<_> = text::extract_iter(page, &prefix, "\"")
        .map(|path| format!("https://{CDN_HOST}/{path}"))
        .collect();
    Some(found)
}

/// Thumbnails inside the legacy `#wtf` block.
fn legacy_thumbnails(page: &str) -> Option<Vec<String>> {
    let section = text::extr(page, "id=\"wtf\"", "</div>");
    if section.is_empty() {
        return None;
    }
    Some(
        text::extract_iter(section, " src='", "'")
            .map(str::to_string)
            .collect(),
    )
}

/// Rewrite an Imagevenue reference into a directly fetchable URL.
///
/// CDN references pass through unchanged. Legacy thumbnails are mapped to
/// the `img.php` endpoint on the same server. Anything else loses its query
/// string.
pub fn normalize_imagevenue(reference: &str) -> Result<String, NormalizeError> {
    let parsed = Url::parse(reference).map_err(|source| NormalizeError::InvalidUrl {
        reference: reference.to_string(),
        source,
    })?;
    let host = parsed
        .host_str()
        .ok_or_else(|| NormalizeError::MissingHost(reference.to_string()))?;

    if host == CDN_HOST {
        return Ok(reference.to_string());
    }

    if host == LEGACY_DOMAIN || host.ends_with(&format!(".{LEGACY_DOMAIN}")) {
        let server = host.split('.').next().unwrap_or(host);
        for regex in THUMBNAIL_REGEXES.iter() {
            if let Some(filename) = regex.captures(reference).and_then(|c| c.get(1)) {
                return Ok(DIRECT_TEMPLATE
                    .replace("{server}", server)
                    .replace("{filename}", filename.as_str()));
            }
        }
    }

    Ok(strip_query(reference).to_string())
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(head, _)| head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locate(url: &str) -> UrlgalleriesGallery {
        let caps = URL_REGEX.captures(url).unwrap();
        let gallery = UrlgalleriesExtractor.locate(url).unwrap();
        // params() mirrors the captured fields
        let params = gallery.params();
        assert_eq!(params[1].1, caps[4]);
        UrlgalleriesGallery {
            blog: params[0].1.clone(),
            gallery_id: params[1].1.clone(),
        }
    }

    #[test]
    fn locates_blog_path_urls() {
        let g = locate("https://urlgalleries.net/b/someblog/porn-gallery-98765/Some-Title");
        assert_eq!(g.blog, "someblog");
        assert_eq!(g.gallery_id, "98765");
    }

    #[test]
    fn falls_back_to_subdomain_blog() {
        let g = locate("https://someblog.urlgalleries.net/porn-gallery-4321/x");
        assert_eq!(g.blog, "someblog");
        assert_eq!(g.gallery_id, "4321");
        assert_eq!(
            g.page_url(),
            "https://urlgalleries.net/b/someblog/porn-gallery-4321/?a=10000"
        );
    }

    #[test]
    fn path_blog_wins_over_subdomain() {
        let g = locate("http://www.urlgalleries.net/b/pathblog/gallery-1/");
        assert_eq!(g.blog, "pathblog");
    }

    #[test]
    fn does_not_match_other_hosts() {
        assert!(!UrlgalleriesExtractor.matches("https://example.com/b/blog/gallery-1"));
        assert!(!UrlgalleriesExtractor.matches("https://urlgalleries.net/b/blog/"));
    }

    #[test]
    fn parses_metadata_in_page_order() {
        let page = r#"
            <a href="/" title="URLGalleries">home</a>
            <a href="/b/someblog" title="Some &amp; Blog">blog</a>
            <a href="/report" title="Report">report</a>
            <h1 title="  My Gallery &quot;One&quot;  ">x</h1>
            <span>42 images in gallery | March 05, 2021</span>
        "#;
        let gallery = UrlgalleriesGallery {
            blog: "someblog".into(),
            gallery_id: "1".into(),
        };
        let meta = gallery.metadata(page);
        assert_eq!(meta.category, "urlgalleries");
        assert_eq!(meta.count, 0);
        assert_eq!(
            meta.fields,
            SiteFields::Urlgalleries(Fields {
                gallery_id: "1".into(),
                blog: "Some & Blog".into(),
                title: "My Gallery \"One\"".into(),
                date: NaiveDate::from_ymd_opt(2021, 3, 5),
            })
        );
    }

    #[test]
    fn metadata_degrades_on_empty_page() {
        let gallery = UrlgalleriesGallery {
            blog: "b".into(),
            gallery_id: "7".into(),
        };
        let SiteFields::Urlgalleries(fields) = gallery.metadata("<html></html>").fields else {
            panic!("wrong field block");
        };
        assert_eq!(fields.gallery_id, "7");
        assert!(fields.title.is_empty());
        assert!(fields.blog.is_empty());
        assert_eq!(fields.date, None);
    }

    #[test]
    fn cdn_images_take_priority_over_legacy() {
        let page = r#"
            <img src="https://cdno-data.imagevenue.com/html.fvi/aa/bb/1_a.jpg">
            <div id="wtf"><img src='http://img5.imagevenue.com/loc1/th_1_a.jpg'></div>
            <img src="https://cdno-data.imagevenue.com/html.fvi/cc/dd/2_b.jpg">
        "#;
        let refs: Vec<_> = UrlgalleriesGallery {
            blog: String::new(),
            gallery_id: "1".into(),
        }
        .images(page)
        .into_iter()
        .map(|r| r.raw)
        .collect();
        assert_eq!(
            refs,
            vec![
                "https://cdno-data.imagevenue.com/html.fvi/aa/bb/1_a.jpg",
                "https://cdno-data.imagevenue.com/html.fvi/cc/dd/2_b.jpg",
            ]
        );
    }

    #[test]
    fn legacy_section_used_without_cdn() {
        let page = r#"
            <img src='http://outside.example/ignored.jpg'>
            <div id="wtf">
              <a><img src='http://img5.imagevenue.com/loc1/th_11_a.jpg'></a>
              <a><img src='/relative/th_12_b.jpg'></a>
              <a><img src='http://img7.imagevenue.com/th_13_c.jpg'></a>
            </div>
            <img src='http://after.example/ignored.jpg'>
        "#;
        let refs: Vec<_> = UrlgalleriesGallery {
            blog: String::new(),
            gallery_id: "1".into(),
        }
        .images(page)
        .into_iter()
        .map(|r| r.raw)
        .collect();
        assert_eq!(
            refs,
            vec![
                "http://img5.imagevenue.com/loc1/th_11_a.jpg",
                "http://img7.imagevenue.com/th_13_c.jpg",
            ]
        );
    }

    #[test]
    fn no_images_on_bare_page() {
        assert!(legacy_thumbnails("<div>nothing</div>").is_none());
        assert_eq!(cdn_images("<div>nothing</div>"), Some(Vec::new()));
    }

    #[test]
    fn cdn_reference_is_unchanged() {
        let url = "https://cdno-data.imagevenue.com/html.fvi/aa/bb/1_a.jpg?x=1";
        assert_eq!(normalize_imagevenue(url).unwrap(), url);
    }

    #[test]
    fn loc_prefixed_thumbnail_becomes_direct() {
        let url = "http://img5.imagevenue.com/loc567/th_98765_photo_123lo.jpg";
        assert_eq!(
            normalize_imagevenue(url).unwrap(),
            "https://img5.imagevenue.com/img.php?image=98765_photo_123lo.jpg"
        );
    }

    #[test]
    fn img_prefixed_thumbnail_becomes_direct() {
        let url = "https://img22.imagevenue.com/img_4567_beach.png";
        assert_eq!(
            normalize_imagevenue(url).unwrap(),
            "https://img22.imagevenue.com/img.php?image=4567_beach.png"
        );
    }

    #[test]
    fn bare_numeric_filename_becomes_direct() {
        let url = "http://img103.imagevenue.com/aAfkjfp01fo1i-1234/loc01/55555_pic.gif";
        assert_eq!(
            normalize_imagevenue(url).unwrap(),
            "https://img103.imagevenue.com/img.php?image=55555_pic.gif"
        );
    }

    #[test]
    fn unmatched_legacy_name_loses_query() {
        let url = "http://img5.imagevenue.com/view.php?id=abc";
        assert_eq!(
            normalize_imagevenue(url).unwrap(),
            "http://img5.imagevenue.com/view.php"
        );
    }

    #[test]
    fn unknown_host_strips_query_only() {
        let url = "https://images.example.org/path/th_1_a.jpg?w=200&h=100";
        assert_eq!(
            normalize_imagevenue(url).unwrap(),
            "https://images.example.org/path/th_1_a.jpg"
        );
    }

    #[test]
    fn hostless_reference_is_an_error() {
        assert!(matches!(
            normalize_imagevenue("http://"),
            Err(NormalizeError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn fetch_policy_detects_not_found_redirect() {
        let policy = UrlgalleriesGallery {
            blog: String::new(),
            gallery_id: "1".into(),
        }
        .fetch_policy();
        assert!(!policy.follow_redirects);
        assert_eq!(policy.not_found_marker, Some("/not_found_adult.php"));
    }
}
