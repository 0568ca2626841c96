use anyhow::Result;

use galx::{GalleryError, GalleryRouter};

pub fn cmd_classify(url: &str) -> Result<()> {
    let router = GalleryRouter::new();
    let (extractor, gallery) = router
        .locate(url)
        .ok_or_else(|| GalleryError::Unsupported(url.to_string()))?;

    println!("extractor: {}", extractor.name());
    println!("category:  {}", gallery.category());
    println!("page:      {}", gallery.page_url());
    for (name, value) in gallery.params() {
        println!("  {name}: {value}");
    }
    Ok(())
}
