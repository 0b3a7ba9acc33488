//! End-to-end runs of the matcher over synthetic screenshots.

use image::{imageops, GrayImage, Luma, Rgba, RgbaImage};
use std::path::Path;
use tempfile::TempDir;
use unique_matcher::{
    DebugCollector, GuideEdge, MatchError, MatchResult, MatchedBy, Matcher, MatcherConfig,
    OcrEngine, SocketColor,
};
use um_vision::ItemGenerator;

const CATALOG: &str = "\
name,file,alias,base,sockets,columns,width,height,enabled,global
Berek's Grip,Bereks_Grip,,Two-Stone Ring,0,0,1,1,1,1
Berek's Grip Legacy,Bereks_Grip_Legacy,Bereks_Grip,Two-Stone Ring,0,0,1,1,1,1
Wanderlust,Wanderlust,,Wool Shoes,0,0,1,1,1,1
Wondertrap,Wondertrap,,Wool Shoes,0,0,1,1,1,1
Belt One,Belt_One,,Leather Belt,0,0,1,1,1,1
Belt Two,Belt_Two,,Leather Belt,0,0,1,1,1,1
Vest One,Vest_One,,Plate Vest,1,1,,,1,1
Vest Two,Vest_Two,,Plate Vest,1,1,,,1,1
Retired Ring,Retired_Ring,,Iron Ring,0,0,1,1,0,1
";

/// Top-left of the start marker in every screenshot
const START: (u32, u32) = (150, 40);
const END: (u32, u32) = (300, 40);

/// Returns the same text for every image
struct ScriptedOcr(String);

impl OcrEngine for ScriptedOcr {
    fn image_to_string(&self, _image: &GrayImage) -> Result<String, MatchError> {
        Ok(self.0.clone())
    }
}

fn pattern(w: u32, h: u32, f: impl Fn(u32, u32) -> bool) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| if f(x, y) { Luma([230]) } else { Luma([20]) })
}

fn one_line() -> GrayImage {
    pattern(12, 16, |_, y| y % 4 < 2)
}

fn one_line_end() -> GrayImage {
    pattern(12, 16, |x, _| x % 4 < 2)
}

fn two_line() -> GrayImage {
    pattern(12, 24, |x, y| (x / 2 + y / 2) % 2 == 0)
}

fn two_line_end() -> GrayImage {
    pattern(12, 24, |x, y| (x + y) % 6 < 3)
}

fn gradient(w: u32, h: u32, seed: u8) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        Rgba([
            (x * 5) as u8 ^ seed,
            (y * 3) as u8,
            ((x + y) * 2) as u8 ^ seed.rotate_left(3),
            255,
        ])
    })
}

fn icon(file: &str) -> RgbaImage {
    match file {
        "Wanderlust" => gradient(40, 40, 0),
        "Wondertrap" => gradient(40, 40, 0b1010_0101),
        "Vest_One" => gradient(156, 312, 0b0011_0011),
        "Vest_Two" => gradient(156, 312, 0b1100_0000),
        // Identical artwork, only histograms could tell them apart
        _ => RgbaImage::from_pixel(40, 40, Rgba([150, 90, 60, 255])),
    }
}

fn glyph(color: SocketColor) -> RgbaImage {
    let c = match color {
        SocketColor::Red => [210, 30, 30],
        SocketColor::Green => [30, 210, 30],
        SocketColor::Blue => [30, 30, 210],
        SocketColor::White => [230, 230, 230],
    };
    RgbaImage::from_pixel(36, 36, Rgba([c[0], c[1], c[2], 255]))
}

fn write_data_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    std::fs::write(root.join("items.csv"), CATALOG).unwrap();

    std::fs::create_dir_all(root.join("items")).unwrap();
    for file in [
        "Bereks_Grip",
        "Bereks_Grip_Legacy",
        "Wanderlust",
        "Wondertrap",
        "Belt_One",
        "Belt_Two",
        "Vest_One",
        "Vest_Two",
        "Retired_Ring",
    ] {
        icon(file).save(root.join("items").join(format!("{}.png", file))).unwrap();
    }

    std::fs::create_dir_all(root.join("sockets")).unwrap();
    for color in SocketColor::ALL {
        glyph(color)
            .save(root.join("sockets").join(format!("socket-src-{}.png", color.suffix())))
            .unwrap();
    }

    let templates = root.join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    one_line().save(templates.join("unique-one-line-fullhd.png")).unwrap();
    one_line_end().save(templates.join("unique-one-line-end-fullhd.png")).unwrap();
    two_line().save(templates.join("unique-two-line-fullhd.png")).unwrap();
    two_line_end().save(templates.join("unique-two-line-end-fullhd.png")).unwrap();
    pattern(12, 20, |x, y| (x / 3 + y) % 3 == 0)
        .save(templates.join("unique-two-line-fullhd-compressed.png"))
        .unwrap();
    pattern(12, 20, |x, y| (x + 2 * y) % 5 < 2)
        .save(templates.join("unique-two-line-end-fullhd-compressed.png"))
        .unwrap();

    dir
}

fn matcher(data_dir: &Path, ocr_text: &str) -> Matcher {
    matcher_with(data_dir, ocr_text, |_| {})
}

fn matcher_with(
    data_dir: &Path,
    ocr_text: &str,
    tweak: impl FnOnce(&mut MatcherConfig),
) -> Matcher {
    let mut config = MatcherConfig {
        data_dir: data_dir.to_path_buf(),
        ..MatcherConfig::default()
    };
    tweak(&mut config);
    Matcher::with_ocr(config, Box::new(ScriptedOcr(ocr_text.to_string()))).unwrap()
}

/// A 360x260 screenshot with title markers and the given artwork left of the start marker.
fn screenshot(identified: bool, artwork: Option<&RgbaImage>) -> RgbaImage {
    let mut screen = RgbaImage::from_pixel(360, 260, Rgba([90, 90, 90, 255]));

    let (start, end) = if identified {
        (two_line(), two_line_end())
    } else {
        (one_line(), one_line_end())
    };
    for (marker, (x, y)) in [(start, START), (end, END)] {
        let rgba = image::DynamicImage::ImageLuma8(marker).to_rgba8();
        imageops::replace(&mut screen, &rgba, x as i64, y as i64);
    }

    if let Some(artwork) = artwork {
        imageops::replace(&mut screen, artwork, START.0 as i64 - 99, START.1 as i64);
    }
    screen
}

/// 99x200 artwork with `item_icon` in the top-right 1x1 cell area
fn small_item_artwork(item_icon: &RgbaImage) -> RgbaImage {
    let mut artwork = RgbaImage::from_pixel(99, 200, Rgba([10, 10, 10, 255]));
    imageops::replace(&mut artwork, item_icon, 55, 5);
    artwork
}

fn find(matcher: &Matcher, screen: &RgbaImage) -> Result<MatchResult, MatchError> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("screenshot.png");
    screen.save(&path).unwrap();
    matcher.find_item(&path)
}

#[test]
fn test_only_unique_for_base() {
    let data = write_data_dir();
    let matcher = matcher(data.path(), "TWO-STONE RING\n");

    let result = find(&matcher, &screenshot(false, None)).unwrap();

    assert_eq!(result.item.file, "Bereks_Grip");
    assert_eq!(result.matched_by, MatchedBy::OnlyUniqueForBase);
    assert_eq!(result.identified, Some(false));
    assert_eq!(result.min_val, 0.0);
}

#[test]
fn test_identified_item_by_name_resolves_alias() {
    let data = write_data_dir();
    let matcher = matcher(data.path(), "BEREK'S GRIP LEGACY\nTWO-STONE RING\n");

    let result = find(&matcher, &screenshot(true, None)).unwrap();

    assert_eq!(result.item.file, "Bereks_Grip");
    assert_eq!(result.matched_by, MatchedBy::ItemName);
    assert_eq!(result.identified, Some(true));
}

#[test]
fn test_name_matching_can_be_disabled() {
    let data = write_data_dir();
    let matcher = matcher_with(data.path(), "WANDERLUST\nWOOL SHOES\n", |c| {
        c.find_item_by_name = false;
    });

    let artwork = small_item_artwork(&icon("Wanderlust"));
    let result = find(&matcher, &screenshot(true, Some(&artwork))).unwrap();

    assert_eq!(result.item.file, "Wanderlust");
    assert_eq!(result.matched_by, MatchedBy::TemplateMatch);
}

#[test]
fn test_template_match_picks_painted_item() {
    let data = write_data_dir();
    let matcher = matcher(data.path(), "WOOL SHOES\n");

    for (painted, other) in [("Wanderlust", "Wondertrap"), ("Wondertrap", "Wanderlust")] {
        let artwork = small_item_artwork(&icon(painted));
        let result = find(&matcher, &screenshot(false, Some(&artwork))).unwrap();

        assert_eq!(result.item.file, painted, "expected {} over {}", painted, other);
        assert_eq!(result.matched_by, MatchedBy::TemplateMatch);
        assert!(result.min_val < 1e-6);
        assert_eq!(result.sockets(), Some(0));
    }
}

#[test]
fn test_socketed_item_matches_generated_variant() {
    let data = write_data_dir();
    let matcher = matcher(data.path(), "PLATE VEST\n");

    // Render the exact 1-socket red variant of Vest One into the artwork
    let generator = ItemGenerator::load(data.path()).unwrap();
    let vest = matcher.catalog().get("Vest_One").unwrap().clone();
    let variants = generator.variants(&icon("Vest_One"), &vest).unwrap();
    let red = variants
        .iter()
        .find(|v| v.color == Some(SocketColor::Red) && v.sockets == 1)
        .unwrap();

    let mut artwork = RgbaImage::from_pixel(99, 200, Rgba([10, 10, 10, 255]));
    imageops::replace(&mut artwork, &red.image, 0, 0);

    let result = find(&matcher, &screenshot(false, Some(&artwork))).unwrap();

    assert_eq!(result.item.file, "Vest_One");
    assert_eq!(result.sockets(), Some(1));
    assert_eq!(result.template.as_ref().and_then(|t| t.color), Some(SocketColor::Red));
}

#[test]
fn test_identical_artwork_is_inconclusive() {
    let data = write_data_dir();
    let matcher = matcher(data.path(), "LEATHER BELT\n");

    let artwork = small_item_artwork(&icon("Belt_One"));
    let err = find(&matcher, &screenshot(false, Some(&artwork))).unwrap_err();

    assert!(matches!(err, MatchError::InconclusiveMatch(_)), "got {:?}", err);
    assert_eq!(err.kind(), "inconclusive_match");
}

#[test]
fn test_unknown_base() {
    let data = write_data_dir();
    let matcher = matcher(data.path(), "GOLDEN PLATE\n");

    let err = find(&matcher, &screenshot(false, None)).unwrap_err();
    assert!(matches!(err, MatchError::BaseNotRecognized(ref b) if b == "Golden Plate"));
}

#[test]
fn test_disabled_items_are_not_loaded() {
    let data = write_data_dir();
    let matcher = matcher(data.path(), "IRON RING\n");

    assert!(matcher.catalog().get("Retired_Ring").is_err());
    let err = find(&matcher, &screenshot(false, None)).unwrap_err();
    assert!(matches!(err, MatchError::BaseNotRecognized(_)));
}

#[test]
fn test_missing_markers() {
    let data = write_data_dir();
    let matcher = matcher(data.path(), "TWO-STONE RING\n");

    let blank = RgbaImage::from_pixel(360, 260, Rgba([90, 90, 90, 255]));
    let err = find(&matcher, &blank).unwrap_err();
    assert!(matches!(err, MatchError::AnchorNotFound(GuideEdge::Start)));
}

#[test]
fn test_strict_resolution() {
    let data = write_data_dir();
    let matcher = matcher_with(data.path(), "TWO-STONE RING\n", |c| {
        c.allow_non_full_hd = false;
    });

    let err = find(&matcher, &screenshot(false, None)).unwrap_err();
    assert!(matches!(
        err,
        MatchError::NotFullResolution {
            width: 360,
            height: 260
        }
    ));
}

#[test]
fn test_missing_screenshot_file() {
    let data = write_data_dir();
    let matcher = matcher(data.path(), "TWO-STONE RING\n");

    let err = matcher.find_item(&data.path().join("nope.png")).unwrap_err();
    assert_eq!(err.kind(), "image");
}

#[test]
fn test_find_unique_extracts_title_and_artwork() {
    let data = write_data_dir();
    let matcher = matcher(data.path(), "WANDERLUST\nWOOL SHOES\n");

    let info = matcher
        .find_unique_image(&screenshot(true, Some(&small_item_artwork(&icon("Wanderlust")))))
        .unwrap();

    assert!(info.identified);
    assert_eq!(info.base, "Wool Shoes");
    assert_eq!(info.name, "Wanderlust");
    assert_eq!(info.image.dimensions(), (99, 200));
}

#[test]
fn test_debug_collector_sees_every_candidate() {
    let data = write_data_dir();
    let matcher = matcher(data.path(), "WOOL SHOES\n");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("screenshot.png");
    screenshot(false, Some(&small_item_artwork(&icon("Wondertrap"))))
        .save(&path)
        .unwrap();

    let mut collector = DebugCollector::default();
    let result = matcher.find_item_observed(&path, &mut collector).unwrap();
    assert_eq!(result.item.file, "Wondertrap");

    assert!(collector.unique_image.is_some());
    assert_eq!(collector.candidate_images.len(), 2);
    assert_eq!(collector.results_all.len(), 2);

    let out = dir.path().join("debug");
    collector.save(&out).unwrap();
    assert!(out.join("results.json").exists());
    assert!(out.join("candidate_Wanderlust.png").exists());
}

#[test]
fn test_matcher_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Matcher>();
}
