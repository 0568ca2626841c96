//! wikifeet.com / wikifeetx.com / men.wikifeet.com celebrity galleries.
//!
//! The celebrity page embeds its image list as JSON. Several page layouts
//! have been seen in the wild, so the list is looked up under a chain of
//! markers and the first one that parses wins.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::{
    retain_network_urls, run_chain, Gallery, GalleryExtractor, GalleryMetadata, ImageInfo,
    ImageReference, SiteFields, Strategy,
};
use crate::classify::FetchPolicy;
use crate::config::SiteDefaults;
use crate::text::{self, scan_fields, Clean, Field};

/// Image URL template, `{domain}` is the site variant's domain.
pub const PICS_TEMPLATE: &str = "https://pics.{domain}/{pid}.jpg";

/// Tag code → label. Unknown codes are dropped.
pub const TAG_LABELS: [(char, &str); 6] = [
    ('C', "Close-up"),
    ('T', "Toenails"),
    ('N', "Nylons"),
    ('A', "Arches"),
    ('S', "Soles"),
    ('B', "Barefoot"),
];

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:https?://)(?:(?:www\.)?wikifeetx?|men\.wikifeet)\.com)/([^/?#]+)").unwrap()
});

const FIELD_SCRIPT: [Field; 5] = [
    Field::new("\"ratingValue\": \"", "\"", Clean::Raw),
    Field::new("times'>", "</h1>", Clean::Unescape),
    Field::new("Shoe Size:", "edit", Clean::StripHtml),
    Field::new("Birthplace:", "edit", Clean::StripHtml),
    Field::new("Birth Date:", "edit", Clean::StripHtml),
];

const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

const IMAGE_CHAIN: [Strategy<Record>; 3] = [
    Strategy {
        name: "gdata-assignment",
        run: gdata_assignment,
    },
    Strategy {
        name: "gallery-key",
        run: gallery_key,
    },
    Strategy {
        name: "record-list",
        run: record_list,
    },
];

/// Site variant, selected by domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Wikifeet,
    Wikifeetx,
}

impl Variant {
    pub fn category(self) -> &'static str {
        match self {
            Self::Wikifeet => "wikifeet",
            Self::Wikifeetx => "wikifeetx",
        }
    }

    pub fn domain(self) -> &'static str {
        match self {
            Self::Wikifeet => "wikifeet.com",
            Self::Wikifeetx => "wikifeetx.com",
        }
    }
}

/// Audience section, selected by subdomain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Women,
    Men,
}

/// Metadata fields for a wikifeet celebrity page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fields {
    pub celeb: String,
    #[serde(rename = "type")]
    pub audience: Audience,
    pub rating: f64,
    pub celebrity: String,
    pub shoesize: String,
    pub birthplace: String,
    pub birthday: Option<NaiveDate>,
}

/// wikifeet extractor.
pub struct WikifeetExtractor;

impl GalleryExtractor for WikifeetExtractor {
    fn name(&self) -> &'static str {
        "wikifeet"
    }

    fn example(&self) -> &'static str {
        "https://www.wikifeet.com/CELEB"
    }

    fn matches(&self, url: &str) -> bool {
        URL_REGEX.is_match(url)
    }

    fn locate(&self, url: &str) -> Option<Box<dyn Gallery>> {
        let caps = URL_REGEX.captures(url)?;
        let root = caps.get(1)?.as_str().to_string();
        let celeb = caps.get(2)?.as_str().to_string();

        let variant = if root.contains("wikifeetx.com") {
            Variant::Wikifeetx
        } else {
            Variant::Wikifeet
        };
        let audience = if root.contains("://men.") {
            Audience::Men
        } else {
            Audience::Women
        };

        Some(Box::new(WikifeetGallery {
            root,
            variant,
            audience,
            celeb,
        }))
    }

    fn defaults(&self) -> SiteDefaults {
        SiteDefaults {
            request_interval: None,
            directory_fmt: &["{category}", "{celebrity}"],
            filename_fmt: "{category}_{celeb}_{pid}.{extension}",
            archive_fmt: Some("{type}_{celeb}_{pid}"),
        }
    }
}

/// A located celebrity page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikifeetGallery {
    pub root: String,
    pub variant: Variant,
    pub audience: Audience,
    pub celeb: String,
}

impl Gallery for WikifeetGallery {
    fn category(&self) -> &'static str {
        self.variant.category()
    }

    fn page_url(&self) -> String {
        format!("{}/{}", self.root, self.celeb)
    }

    fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            resource: "celebrity",
            follow_redirects: true,
            not_found_marker: None,
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let audience = match self.audience {
            Audience::Women => "women",
            Audience::Men => "men",
        };
        vec![
            ("root", self.root.clone()),
            ("variant", self.variant.category().to_string()),
            ("type", audience.to_string()),
            ("celeb", self.celeb.clone()),
        ]
    }

    fn metadata(&self, page: &str) -> GalleryMetadata {
        let [rating, celebrity, shoesize, birthplace, birthday] = scan_fields(page, &FIELD_SCRIPT);

        GalleryMetadata::new(
            self.category(),
            SiteFields::Wikifeet(Fields {
                celeb: self.celeb.clone(),
                audience: self.audience,
                rating: text::parse_float(&rating),
                celebrity,
                shoesize,
                birthplace,
                birthday: text::parse_date(&birthday, BIRTHDAY_FORMAT),
            }),
        )
    }

    fn images(&self, page: &str) -> Vec<ImageReference> {
        let domain = self.variant.domain();
        let mut references: Vec<_> = run_chain(page, &IMAGE_CHAIN)
            .into_iter()
            .map(|record| record.into_reference(domain))
            .collect();
        retain_network_urls(&mut references);
        references
    }
}

// ============================================================================
// Embedded gallery JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct Record {
    pid: Pid,
    #[serde(default, deserialize_with = "lenient_u64")]
    pw: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    ph: u64,
    #[serde(default)]
    tags: Tags,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Pid {
    Text(String),
    Number(u64),
}

/// Tags come as `["S","B"]` or as a run of codes `"SB"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Tags {
    List(Vec<String>),
    Codes(String),
}

impl Default for Tags {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl Tags {
    fn labels(&self) -> Vec<&'static str> {
        let codes: Vec<char> = match self {
            Self::List(list) => list.iter().filter_map(|t| single_char(t)).collect(),
            Self::Codes(codes) => codes.chars().collect(),
        };
        codes.into_iter().filter_map(tag_label).collect()
    }
}

fn single_char(tag: &str) -> Option<char> {
    let mut chars = tag.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

/// Label for a tag code, `None` for unknown codes.
pub fn tag_label(code: char) -> Option<&'static str> {
    TAG_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}

impl Record {
    fn into_reference(self, domain: &str) -> ImageReference {
        let pid = match self.pid {
            Pid::Text(pid) => pid,
            Pid::Number(pid) => pid.to_string(),
        };
        let raw = PICS_TEMPLATE
            .replace("{domain}", domain)
            .replace("{pid}", &pid);
        ImageReference {
            raw,
            info: Some(ImageInfo {
                tags: self.tags.labels(),
                pid,
                width: self.pw,
                height: self.ph,
            }),
        }
    }
}

/// Accept numbers, numeric strings and `null`.
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => n,
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(Raw::Float(f)) if f >= 0.0 => f as u64,
        Some(Raw::Text(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn parse_records(marker: &str, json: &str) -> Option<Vec<Record>> {
    match serde_json::from_str(json) {
        Ok(records) => Some(records),
        Err(e) => {
            debug!(marker, error = %e, "Gallery JSON did not parse");
            None
        }
    }
}

/// `['gdata'] = [...];`
fn gdata_assignment(page: &str) -> Option<Vec<Record>> {
    let json = text::extr(page, "['gdata'] = ", ";");
    if json.is_empty() {
        return None;
    }
    parse_records("gdata", json)
}

/// `"gallery":[...]`, cut at the first closing bracket.
fn gallery_key(page: &str) -> Option<Vec<Record>> {
    let json = text::extr(page, "\"gallery\":", "]");
    if json.is_empty() {
        return None;
    }
    parse_records("gallery", &format!("{json}]"))
}

/// Any `[{"pid":"...}]` list.
fn record_list(page: &str) -> Option<Vec<Record>> {
    let body = text::extr(page, "[{\"pid\":\"", "}]");
    if body.is_empty() {
        return None;
    }
    parse_records("pid-list", &format!("[{{\"pid\":\"{body}}}]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gallery(url: &str) -> WikifeetGallery {
        let caps = URL_REGEX.captures(url).unwrap();
        let located = WikifeetExtractor.locate(url).unwrap();
        let params = located.params();
        assert_eq!(params[3].1, caps[2]);
        WikifeetGallery {
            root: params[0].1.clone(),
            variant: if params[1].1 == "wikifeetx" {
                Variant::Wikifeetx
            } else {
                Variant::Wikifeet
            },
            audience: if params[2].1 == "men" {
                Audience::Men
            } else {
                Audience::Women
            },
            celeb: params[3].1.clone(),
        }
    }

    #[test]
    fn locates_variants_and_audiences() {
        let g = gallery("https://www.wikifeet.com/Some_Celeb");
        assert_eq!(g.variant, Variant::Wikifeet);
        assert_eq!(g.audience, Audience::Women);
        assert_eq!(g.celeb, "Some_Celeb");
        assert_eq!(g.page_url(), "https://www.wikifeet.com/Some_Celeb");

        let g = gallery("https://wikifeetx.com/Other_Celeb?x=1");
        assert_eq!(g.variant, Variant::Wikifeetx);
        assert_eq!(g.category(), "wikifeetx");
        assert_eq!(g.celeb, "Other_Celeb");

        let g = gallery("http://men.wikifeet.com/Some_Actor");
        assert_eq!(g.variant, Variant::Wikifeet);
        assert_eq!(g.audience, Audience::Men);
        assert_eq!(g.root, "http://men.wikifeet.com");
    }

    #[test]
    fn does_not_match_other_sites() {
        assert!(!WikifeetExtractor.matches("https://www.wikifeet.org/Celeb"));
        assert!(!WikifeetExtractor.matches("https://www.wikifeet.com/"));
        assert!(!WikifeetExtractor.matches("https://women.wikifeet.com/Celeb"));
    }

    #[test]
    fn parses_metadata() {
        let page = r#"
            <script type="application/ld+json">{"ratingValue": "4.35"}</script>
            <h1 style='font-size:2em' class='times'>Jane &amp; Doe</h1>
            <div>Shoe Size: <span>8.5 US</span> <a>edit</a></div>
            <div>Birthplace: <span>Oslo,
                Norway</span> <a>edit</a></div>
            <div>Birth Date: <span>1990-07-14</span> <a>edit</a></div>
        "#;
        let g = gallery("https://www.wikifeet.com/Jane_Doe");
        let meta = g.metadata(page);
        assert_eq!(meta.category, "wikifeet");
        let SiteFields::Wikifeet(fields) = meta.fields else {
            panic!("wrong field block");
        };
        assert!((fields.rating - 4.35).abs() < f64::EPSILON);
        assert_eq!(fields.celebrity, "Jane & Doe");
        assert_eq!(fields.shoesize, "8.5 US");
        assert_eq!(fields.birthplace, "Oslo, Norway");
        assert_eq!(fields.birthday, NaiveDate::from_ymd_opt(1990, 7, 14));
        assert_eq!(fields.audience, Audience::Women);
    }

    #[test]
    fn metadata_defaults_when_absent() {
        let g = gallery("https://www.wikifeet.com/Nobody");
        let SiteFields::Wikifeet(fields) = g.metadata("<html></html>").fields else {
            panic!("wrong field block");
        };
        assert_eq!(fields.celeb, "Nobody");
        assert!(fields.rating.abs() < f64::EPSILON);
        assert!(fields.celebrity.is_empty());
        assert_eq!(fields.birthday, None);
    }

    #[test]
    fn record_list_page_yields_images_with_tags() {
        let page = r#"<script>var x = [{"pid":"1","pw":100,"ph":200,"tags":["S","B"]},{"pid":"2"}];</script>"#;
        let refs = gallery("https://www.wikifeet.com/Celeb").images(page);
        assert_eq!(refs.len(), 2);

        assert_eq!(refs[0].raw, "https://pics.wikifeet.com/1.jpg");
        assert_eq!(
            refs[0].info,
            Some(ImageInfo {
                pid: "1".into(),
                width: 100,
                height: 200,
                tags: vec!["Soles", "Barefoot"],
            })
        );

        assert_eq!(refs[1].raw, "https://pics.wikifeet.com/2.jpg");
        assert_eq!(
            refs[1].info,
            Some(ImageInfo {
                pid: "2".into(),
                width: 0,
                height: 0,
                tags: vec![],
            })
        );
    }

    #[test]
    fn variant_domain_used_for_pics_host() {
        let page = r#"tdata['gdata'] = [{"pid":77,"pw":"640","ph":480,"tags":"CXT"}];"#;
        let refs = gallery("https://wikifeetx.com/Celeb").images(page);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].raw, "https://pics.wikifeetx.com/77.jpg");
        let info = refs[0].info.as_ref().unwrap();
        assert_eq!(info.pid, "77");
        assert_eq!(info.width, 640);
        assert_eq!(info.tags, vec!["Close-up", "Toenails"]);
    }

    #[test]
    fn malformed_first_marker_falls_through() {
        let page = r#"
            tdata['gdata'] = [{"pid": broken;
            {"gallery":[{"pid":"5","pw":10,"ph":20}]}
        "#;
        let records = gallery_key(page).unwrap();
        assert_eq!(records.len(), 1);
        assert!(gdata_assignment(page).is_none());

        let refs = gallery("https://www.wikifeet.com/Celeb").images(page);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].raw, "https://pics.wikifeet.com/5.jpg");
    }

    #[test]
    fn gallery_key_cut_inside_tags_falls_back_to_record_list() {
        // The first "]" closes the tags array, so the keyed marker fails.
        let page = r#"{"gallery":[{"pid":"8","tags":["A"]},{"pid":"9"}]}"#;
        assert!(gallery_key(page).is_none());

        let refs = gallery("https://www.wikifeet.com/Celeb").images(page);
        let urls: Vec<_> = refs.iter().map(|r| r.raw.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://pics.wikifeet.com/8.jpg", "https://pics.wikifeet.com/9.jpg"]
        );
        assert_eq!(refs[0].info.as_ref().unwrap().tags, vec!["Arches"]);
    }

    #[test]
    fn no_json_means_no_images() {
        let refs = gallery("https://www.wikifeet.com/Celeb").images("<html>no data</html>");
        assert!(refs.is_empty());
    }

    #[test]
    fn unknown_tag_codes_are_dropped() {
        assert_eq!(tag_label('S'), Some("Soles"));
        assert_eq!(tag_label('Z'), None);
        let tags = Tags::List(vec!["N".into(), "ZZ".into(), "Q".into(), "A".into()]);
        assert_eq!(tags.labels(), vec!["Nylons", "Arches"]);
    }
}
