use galx::GalleryRouter;

pub fn cmd_sites() {
    let router = GalleryRouter::new();
    for extractor in router.extractors() {
        println!("{:<14} {}", extractor.name(), extractor.example());
    }
}
