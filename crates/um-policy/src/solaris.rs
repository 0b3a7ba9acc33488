use image::RgbaImage;
use tracing::{debug, info, warn};
use um_catalog::ItemCatalog;
use um_result::{CroppedItemInfo, MatchError, MatchResult, MatchedBy};
use um_vision::image_ops::average_rgb;

use crate::best::{best_result, MatchingAlgorithm};

pub const SOLARIS_CIRCLET_BASE: &str = "Solaris Circlet";

/// Gem box in the 99x200 artwork: left, top, right, bottom
const GEM_REGION: (i64, i64, i64, i64) = (25, 45, 32, 50);

/// Per-channel average separating a lit channel from a dark one
const DOMINANCE_LEVEL: f64 = 100.0;

/// The three circlets that only differ by the color of their gem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolarisGem {
    Flamesight,
    Galesight,
    Thundersight,
}

impl SolarisGem {
    pub fn file(self) -> &'static str {
        match self {
            SolarisGem::Flamesight => "Flamesight",
            SolarisGem::Galesight => "Galesight",
            SolarisGem::Thundersight => "Thundersight",
        }
    }

    pub fn from_file(file: &str) -> Option<Self> {
        match file {
            "Flamesight" => Some(SolarisGem::Flamesight),
            "Galesight" => Some(SolarisGem::Galesight),
            "Thundersight" => Some(SolarisGem::Thundersight),
            _ => None,
        }
    }
}

/// Classify the gem by which color channels dominate the gem region.
pub fn classify_gem(artwork: &RgbaImage) -> Option<SolarisGem> {
    let (left, top, right, bottom) = GEM_REGION;
    let [r, g, b] = average_rgb(artwork, left, top, right, bottom);
    debug!("Solaris gem average color: r={:.1} g={:.1} b={:.1}", r, g, b);

    let level = DOMINANCE_LEVEL;
    if r > level && g < level && b < level {
        Some(SolarisGem::Flamesight)
    } else if r < level && g < level && b > level {
        Some(SolarisGem::Galesight)
    } else if r > level && g > level && b < level {
        Some(SolarisGem::Thundersight)
    } else {
        None
    }
}

/// When template matching lands on one of the gem circlets, let the gem color decide.
/// Returns None when the color rule does not apply.
pub(crate) fn decide(
    results: &[MatchResult],
    cropped: &CroppedItemInfo,
    catalog: &ItemCatalog,
    threshold: f64,
) -> Result<Option<MatchResult>, MatchError> {
    let best = best_result(results, MatchingAlgorithm::Default, threshold)?;
    if SolarisGem::from_file(&best.item.file).is_none() {
        return Ok(None);
    }

    let Some(gem) = classify_gem(&cropped.image) else {
        debug!("Solaris gem color is ambiguous");
        return Ok(None);
    };

    let Ok(item) = catalog.get(gem.file()) else {
        warn!("{} is not in the catalog", gem.file());
        return Ok(None);
    };

    info!("Solaris Circlet gem color points to {}", item.name);
    Ok(Some(MatchResult::decided(
        item.clone(),
        MatchedBy::SolarisCirclet,
        cropped.identified,
    )))
}
