use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use galx::output::{self, OutputFormat};
use galx::{extract_gallery, AcceleratedClient, Config, GalleryError, GalleryRouter, Message};

pub async fn cmd_extract(
    url: &str,
    format: OutputFormat,
    paths: bool,
    archive_keys: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load config")?;
    let router = GalleryRouter::new();
    let (extractor, gallery) = router
        .locate(url)
        .ok_or_else(|| GalleryError::Unsupported(url.to_string()))?;
    let settings = config.site(extractor.name(), extractor.defaults());

    let client = AcceleratedClient::from_config(&config)?;
    let messages = extract_gallery(gallery.as_ref(), &client, settings.request_interval)
        .await
        .with_context(|| format!("Failed to extract {url}"))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for message in &messages {
        if paths || archive_keys {
            let Message::Queue(item) = message else {
                continue;
            };
            if paths {
                writeln!(out, "{}", output::item_path(&settings, item).display())?;
            }
            if let Some(key) = archive_keys.then(|| output::archive_key(&settings, item)).flatten() {
                writeln!(out, "{key}")?;
            }
            continue;
        }
        writeln!(out, "{}", output::render(message, format)?)?;
    }

    Ok(())
}
