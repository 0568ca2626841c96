//! Delimiter-based text extraction over raw page markup.
//!
//! Gallery pages are scanned as plain text rather than parsed into a DOM:
//! the fragments we need sit between stable markers, and the markers keep
//! working on pages that are not well-formed HTML.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Forward-only cursor over page text.
///
/// [`Scanner::take`] is the only primitive. The cursor never rewinds, so the
/// order of `take` calls has to follow the order of fields in the page.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Return the text between the next `start` and the following `end`,
    /// advancing past `end`.
    ///
    /// If either delimiter is missing the result is empty and the cursor
    /// stays where it was.
    pub fn take(&mut self, start: &str, end: &str) -> &'a str {
        let rest = &self.text[self.pos..];
        let Some(s) = rest.find(start) else {
            return "";
        };
        let from = self.pos + s + start.len();
        let Some(e) = self.text[from..].find(end) else {
            return "";
        };
        self.pos = from + e + end.len();
        &self.text[from..from + e]
    }

    /// Current byte offset into the text.
    pub fn position(&self) -> usize {
        self.pos
    }
}

/// How a raw fragment is cleaned before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clean {
    Raw,
    Unescape,
    UnescapeTrim,
    StripHtml,
}

impl Clean {
    pub fn apply(self, raw: &str) -> String {
        match self {
            Self::Raw => raw.to_string(),
            Self::Unescape => unescape(raw),
            Self::UnescapeTrim => unescape(raw).trim().to_string(),
            Self::StripHtml => remove_html(raw),
        }
    }
}

/// One step of a field script: the delimiters and the cleaning rule.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub start: &'static str,
    pub end: &'static str,
    pub clean: Clean,
}

impl Field {
    pub const fn new(start: &'static str, end: &'static str, clean: Clean) -> Self {
        Self { start, end, clean }
    }
}

/// Run a field script against `page`, one shared cursor for all fields.
///
/// Missing fields come back as empty strings.
pub fn scan_fields<const N: usize>(page: &str, script: &[Field; N]) -> [String; N] {
    let mut scanner = Scanner::new(page);
    // from_fn visits indices in ascending order
    std::array::from_fn(|i| {
        let field = &script[i];
        field.clean.apply(scanner.take(field.start, field.end))
    })
}

/// Text between the first `start` and the following `end`, or `""`.
pub fn extr<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    Scanner::new(text).take(start, end)
}

/// Every non-overlapping fragment between `start` and `end`.
pub fn extract_iter<'a>(
    text: &'a str,
    start: &'a str,
    end: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    let mut scanner = Scanner::new(text);
    std::iter::from_fn(move || {
        let before = scanner.position();
        let value = scanner.take(start, end);
        (scanner.position() != before).then_some(value)
    })
}

/// Decode HTML character references (`&amp;`, `&#39;`, ...).
///
/// Only references are touched; a literal `<` stays text.
pub fn unescape(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Drop markup, decode entities and collapse whitespace runs.
pub fn remove_html(text: &str) -> String {
    let stripped = TAG_REGEX.replace_all(text, " ");
    unescape(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a decimal, `0.0` when the text is not a number.
pub fn parse_float(text: &str) -> f64 {
    text.trim().parse().unwrap_or(0.0)
}

/// Parse a calendar date with a strftime-style format; `None` on mismatch.
pub fn parse_date(text: &str, format: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(text, format) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!(text, format, error = %e, "Unparseable date");
            None
        }
    }
}
