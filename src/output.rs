//! Rendering of event streams and output path templates.
//!
//! Templates use `{field}` placeholders resolved against the JSON form of an
//! event; `{field:>0N}` zero-pads to width `N`. Unknown fields render empty.

use std::path::PathBuf;

use serde_json::{Map, Value};
use url::Url;

use crate::config::SiteSettings;
use crate::emit::{Message, QueueItem};
use crate::site::SiteFields;

/// Output format for the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable summary
    Text,
}

/// Render one message as a line of output.
pub fn render(message: &Message, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(message),
        OutputFormat::Text => Ok(render_text(message)),
    }
}

fn render_text(message: &Message) -> String {
    match message {
        Message::Directory(meta) => {
            let label = match &meta.fields {
                SiteFields::Urlgalleries(f) => format!("{} [{}] {}", f.gallery_id, f.blog, f.title),
                SiteFields::Wikifeet(f) => format!("{} ({})", f.celebrity, f.celeb),
            };
            format!("📁 {}: {} ({} images)", meta.category, label.trim(), meta.count)
        }
        Message::Queue(item) => format!("{:>4}  {}", item.num, item.url),
    }
}

/// File path for a queued image under the site's directory and filename
/// templates.
pub fn item_path(settings: &SiteSettings, item: &QueueItem) -> PathBuf {
    let fields = template_fields(item);
    let mut path: PathBuf = settings
        .directory_fmt
        .iter()
        .map(|segment| render_template(segment, &fields))
        .filter(|segment| !segment.is_empty())
        .collect();
    path.push(render_template(&settings.filename_fmt, &fields));
    path
}

/// Archive key for a queued image, when the site defines one.
pub fn archive_key(settings: &SiteSettings, item: &QueueItem) -> Option<String> {
    let fields = template_fields(item);
    settings
        .archive_fmt
        .as_deref()
        .map(|fmt| render_template(fmt, &fields))
}

/// JSON fields of a queue item plus the derived `extension`.
fn template_fields(item: &QueueItem) -> Map<String, Value> {
    let mut fields = match serde_json::to_value(item) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    fields.insert("extension".into(), Value::String(extension_of(&item.url)));
    fields
}

/// Substitute `{name}` / `{name:>0N}` placeholders.
pub fn render_template(template: &str, fields: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let placeholder = &rest[open + 1..open + close];
        out.push_str(&expand(placeholder, fields));
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

fn expand(placeholder: &str, fields: &Map<String, Value>) -> String {
    let (name, spec) = placeholder
        .split_once(':')
        .map_or((placeholder, None), |(n, s)| (n, Some(s)));

    let value = match fields.get(name) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    };

    let value = match spec.and_then(|s| s.strip_prefix(">0")).and_then(|w| w.parse::<usize>().ok()) {
        Some(width) => format!("{value:0>width$}"),
        None => value,
    };
    sanitize(&value)
}

/// Keep rendered values from introducing path separators.
fn sanitize(value: &str) -> String {
    value.replace(['/', '\\'], "_")
}

/// File extension of an image URL, looking inside `img.php?image=` links.
pub fn extension_of(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    let name = parsed
        .query_pairs()
        .find(|(k, _)| k == "image")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| parsed.path().to_string());

    name.rsplit('/')
        .next()
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}
