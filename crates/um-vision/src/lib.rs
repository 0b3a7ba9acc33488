pub mod anchor;
pub mod corrections;
pub mod generator;
pub mod histogram;
pub mod image_ops;
pub mod matching;
pub mod ocr;
pub mod title;

pub use anchor::{Anchor, AnchorLocator, AnchorMarkers, ItemRegions, FULL_HD, THRESHOLD_CONTROL};
pub use corrections::OcrCorrections;
pub use generator::{ItemGenerator, ITEM_MAX_SIZE, LINK_WIDTH};
pub use histogram::{compare_histograms, HsHistogram};
pub use matching::{best_match, crop_by_dimensions, ItemMatcher, TemplateMatch};
pub use ocr::{OcrEngine, TesseractCli};
pub use title::{clean_title, ParsedTitle, TitleParser};
