//! CLI tool to run a saved screenshot through the locate and OCR steps.
//! Usage: cargo run -p um-vision --features cli --bin analyze_screenshot -- <screenshot.png> [data_dir] [output_dir]

use image::{imageops, Rgba};
use std::path::PathBuf;
use um_catalog::{CatalogOptions, ItemCatalog};
use um_vision::image_ops::expand_border;
use um_vision::{
    clean_title, AnchorLocator, AnchorMarkers, OcrCorrections, OcrEngine, TesseractCli, TitleParser,
    THRESHOLD_CONTROL,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <screenshot.png> [data_dir] [output_dir]", args[0]);
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let data_dir = PathBuf::from(args.get(2).map(String::as_str).unwrap_or("data"));
    let output_dir = PathBuf::from(args.get(3).map(String::as_str).unwrap_or("./debug_output"));
    let _ = std::fs::create_dir_all(&output_dir);

    println!("Loading image: {}", input_path.display());
    let img = image::open(&input_path)
        .expect("Failed to open image")
        .to_rgba8();
    println!("Image size: {}x{}", img.width(), img.height());

    let markers = AnchorMarkers::load(&data_dir).expect("Failed to load anchor markers");
    let locator = AnchorLocator::new(markers, THRESHOLD_CONTROL, true);

    println!("\n=== Anchors ===");
    let gray = imageops::grayscale(&img);
    let Some(start) = locator.locate_start(&gray) else {
        println!("Start marker: NOT FOUND");
        std::process::exit(2);
    };
    println!(
        "Start marker: x={} y={} ({})",
        start.loc.0,
        start.loc.1,
        if start.identified { "identified" } else { "unidentified" }
    );

    let Some(end) = locator.locate_end(&gray, start.identified) else {
        println!("End marker: NOT FOUND");
        std::process::exit(2);
    };
    println!("End marker: x={} y={}", end.0, end.1);

    let artwork = locator.crop_artwork(&img, start);
    let title = locator.crop_title(&img, start, end);
    let _ = artwork.save(output_dir.join("artwork.png"));
    let _ = title.save(output_dir.join("title.png"));
    println!("Artwork: {}x{}", artwork.width(), artwork.height());
    println!("Title: {}x{}", title.width(), title.height());

    println!("\n=== OCR ===");
    let ocr = TesseractCli::default();
    if !ocr.is_available() {
        println!("Tesseract not available, skipping");
        return;
    }

    let bordered = expand_border(&title, 1, Rgba([255, 255, 255, 255]));
    match ocr.image_to_string(&imageops::grayscale(&bordered)) {
        Ok(raw) => {
            println!("Raw: {:?}", raw);
            println!("Cleaned: {:?}", clean_title(&raw));
        }
        Err(e) => println!("OCR failed: {}", e),
    }

    let catalog = match ItemCatalog::load(&data_dir, CatalogOptions::default()) {
        Ok(c) => c,
        Err(e) => {
            println!("Catalog not loaded ({}), skipping title parsing", e);
            return;
        }
    };
    let corrections = OcrCorrections::load_or_default(&data_dir.join("corrections.json"))
        .expect("Failed to load OCR corrections");
    let parser = TitleParser::new(Box::new(ocr), corrections, false);

    match parser.parse_title(&catalog, &title, start.identified) {
        Ok(parsed) => {
            println!("Base: {}", parsed.base);
            println!("Name: {}", if parsed.name.is_empty() { "<unknown>" } else { &parsed.name });
        }
        Err(e) => println!("Title parsing failed: {}", e),
    }
}
