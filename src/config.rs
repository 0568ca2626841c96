//! Configuration loaded from `~/.config/galx/config.toml`.
//!
//! Everything here is passed through to the transport or the output layer;
//! the extractors themselves never read it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

use crate::error::ConfigError;

/// Longest accepted politeness delay, in seconds.
pub const MAX_INTERVAL_SECS: f64 = 3600.0;

/// Random delay range, in seconds, waited before each page request.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "IntervalRepr")]
pub struct RequestInterval {
    min: f64,
    max: f64,
}

/// `request_interval = 1.0` or `request_interval = [0.5, 1.5]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum IntervalRepr {
    Fixed(f64),
    Range(f64, f64),
}

impl TryFrom<IntervalRepr> for RequestInterval {
    type Error = ConfigError;

    fn try_from(repr: IntervalRepr) -> Result<Self, Self::Error> {
        let (min, max) = match repr {
            IntervalRepr::Fixed(secs) => (secs, secs),
            IntervalRepr::Range(min, max) => (min, max),
        };
        let finite = min.is_finite() && max.is_finite();
        if !finite || min < 0.0 || max < min || max > MAX_INTERVAL_SECS {
            return Err(ConfigError::Interval(min, max));
        }
        Ok(Self { min, max })
    }
}

impl RequestInterval {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Pick a delay inside the range, capped at [`MAX_INTERVAL_SECS`].
    pub fn sample(&self) -> Duration {
        let secs = if self.max > self.min {
            rand::thread_rng().gen_range(self.min..=self.max)
        } else {
            self.min
        };
        Duration::try_from_secs_f64(secs.clamp(0.0, MAX_INTERVAL_SECS)).unwrap_or_default()
    }
}

/// Built-in per-site settings, provided by each extractor.
#[derive(Debug, Clone, Copy)]
pub struct SiteDefaults {
    pub request_interval: Option<RequestInterval>,
    pub directory_fmt: &'static [&'static str],
    pub filename_fmt: &'static str,
    pub archive_fmt: Option<&'static str>,
}

/// Per-site overrides from the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub request_interval: Option<RequestInterval>,
    pub directory_fmt: Option<Vec<String>>,
    pub filename_fmt: Option<String>,
    pub archive_fmt: Option<String>,
}

/// Effective settings for one site: file values over built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSettings {
    pub request_interval: Option<RequestInterval>,
    pub directory_fmt: Vec<String>,
    pub filename_fmt: String,
    pub archive_fmt: Option<String>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
    /// Keyed by extractor name.
    pub sites: HashMap<String, SiteConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: 30,
            sites: HashMap::new(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields the defaults; an explicitly given path
    /// has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = config_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml(&content, &path.display().to_string())
    }

    /// Parse configuration text; `origin` names it in errors.
    pub fn from_toml(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        tracing::debug!(origin, sites = config.sites.len(), "Loaded config");
        Ok(config)
    }

    /// Settings for the extractor `name`.
    pub fn site(&self, name: &str, defaults: SiteDefaults) -> SiteSettings {
        let file = self.sites.get(name).cloned().unwrap_or_default();

        SiteSettings {
            request_interval: file.request_interval.or(defaults.request_interval),
            directory_fmt: file.directory_fmt.unwrap_or_else(|| {
                defaults
                    .directory_fmt
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect()
            }),
            filename_fmt: file
                .filename_fmt
                .unwrap_or_else(|| defaults.filename_fmt.to_string()),
            archive_fmt: file
                .archive_fmt
                .or_else(|| defaults.archive_fmt.map(str::to_string)),
        }
    }
}

/// Return the path to the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("galx")
        .join("config.toml")
}
