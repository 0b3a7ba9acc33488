use image::RgbaImage;
use serde::Serialize;
use um_catalog::{Item, SocketColor};

mod error;
mod observer;

pub use error::{GuideEdge, MatchError, Result};
pub use observer::{DebugCollector, MatchObserver, NoopObserver};

/// The part of a screenshot that holds the unique item, plus what OCR read from its title
#[derive(Debug, Clone)]
pub struct CroppedItemInfo {
    /// Item artwork, `ITEM_MAX_SIZE` pixels
    pub image: RgbaImage,
    pub base: String,
    /// File key of the item recognized from the title, empty if unknown
    pub name: String,
    pub identified: bool,
}

/// A generated comparison image for one socket count and color
#[derive(Debug, Clone)]
pub struct ItemTemplate {
    pub image: RgbaImage,
    pub sockets: u32,
    /// None for socketless items
    pub color: Option<SocketColor>,
}

/// How the item was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchedBy {
    TemplateMatch,
    HistogramMatch,
    OnlyUniqueForBase,
    ItemName,
    SolarisCirclet,
}

impl std::fmt::Display for MatchedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchedBy::TemplateMatch => "Template matching",
            MatchedBy::HistogramMatch => "Histogram comparison",
            MatchedBy::OnlyUniqueForBase => "Only unique for the base",
            MatchedBy::ItemName => "Item name",
            MatchedBy::SolarisCirclet => "Solaris Circlet plugin",
        };
        f.write_str(s)
    }
}

/// Outcome of scoring one candidate item against the cropped artwork
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub item: Item,
    /// Top-left of the best template position within the candidate crop
    pub loc: (u32, u32),
    pub identified: Option<bool>,
    pub matched_by: MatchedBy,
    /// Normalized squared difference, lower is better
    pub min_val: f64,
    /// Bhattacharyya distance, lower is better
    pub hist_val: f64,
    #[serde(skip)]
    pub template: Option<ItemTemplate>,
}

impl MatchResult {
    /// A result decided without any image scoring.
    pub fn decided(item: Item, matched_by: MatchedBy, identified: bool) -> Self {
        Self {
            item,
            loc: (0, 0),
            identified: Some(identified),
            matched_by,
            min_val: 0.0,
            hist_val: 0.0,
            template: None,
        }
    }

    /// Socket count of the template that produced this result, if any
    pub fn sockets(&self) -> Option<u32> {
        self.template.as_ref().map(|t| t.sockets)
    }
}
