use anyhow::{Context, Result};
use image::{imageops, GrayImage, RgbaImage};
use std::path::Path;
use tracing::{debug, error, info, warn};
use um_result::{GuideEdge, MatchError};

use crate::generator::ITEM_MAX_SIZE;
use crate::image_ops::crop_padded;
use crate::matching::best_match;

/// Highest marker score accepted as a hit. Guides typically score around 0.06.
pub const THRESHOLD_CONTROL: f64 = 0.16;

/// Resolution the marker bitmaps were captured at
pub const FULL_HD: (u32, u32) = (1920, 1080);

/// Title decoration bitmaps that bracket a unique item's name
pub struct AnchorMarkers {
    pub one_line: GrayImage,
    pub one_line_end: GrayImage,
    pub two_line: GrayImage,
    pub two_line_end: GrayImage,
    pub two_line_compressed: GrayImage,
    pub two_line_end_compressed: GrayImage,
}

impl AnchorMarkers {
    /// Load the markers from `data_dir/templates`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("templates");
        let load = |name: &str| -> Result<GrayImage> {
            let path = dir.join(name);
            let img = image::open(&path)
                .with_context(|| format!("Failed to open marker {}", path.display()))?;
            Ok(img.to_luma8())
        };

        let markers = Self {
            one_line: load("unique-one-line-fullhd.png")?,
            one_line_end: load("unique-one-line-end-fullhd.png")?,
            two_line: load("unique-two-line-fullhd.png")?,
            two_line_end: load("unique-two-line-end-fullhd.png")?,
            two_line_compressed: load("unique-two-line-fullhd-compressed.png")?,
            two_line_end_compressed: load("unique-two-line-end-fullhd-compressed.png")?,
        };
        debug!("Loaded anchor markers from {}", dir.display());
        Ok(markers)
    }
}

/// Top-left of the start marker and which title layout it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub loc: (u32, u32),
    pub identified: bool,
}

/// Regions cut out of a screenshot around the located markers
#[derive(Debug, Clone)]
pub struct ItemRegions {
    pub artwork: RgbaImage,
    pub title: RgbaImage,
    pub identified: bool,
}

/// Finds the unique item tooltip in a screenshot.
pub struct AnchorLocator {
    markers: AnchorMarkers,
    threshold: f64,
    allow_non_full_hd: bool,
}

impl AnchorLocator {
    pub fn new(markers: AnchorMarkers, threshold: f64, allow_non_full_hd: bool) -> Self {
        Self {
            markers,
            threshold,
            allow_non_full_hd,
        }
    }

    /// Warn about screenshots that aren't full HD, or reject them in strict mode.
    pub fn check_resolution(&self, width: u32, height: u32) -> Result<(), MatchError> {
        if (width, height) == FULL_HD {
            return Ok(());
        }

        warn!(
            "Screenshot size is not 1920x1080px, accuracy will be impacted (real size is {}x{}px)",
            width, height
        );

        if !self.allow_non_full_hd {
            error!("Non full HD screenshots are disabled, aborting");
            return Err(MatchError::NotFullResolution { width, height });
        }
        Ok(())
    }

    /// Find the start marker: one-line first, then both two-line variants.
    pub fn locate_start(&self, screen: &GrayImage) -> Option<Anchor> {
        let m = &self.markers;
        let attempts = [
            ("one-line", &m.one_line, false),
            ("two-line", &m.two_line, true),
            ("two-line compressed", &m.two_line_compressed, true),
        ];

        for (name, marker, identified) in attempts {
            if let Some(loc) = self.find_marker(screen, name, marker) {
                if identified {
                    info!("Found identified item");
                } else {
                    info!("Found unidentified item");
                }
                return Some(Anchor { loc, identified });
            }
        }

        error!(
            "Couldn't find unique control start, threshold is {}",
            self.threshold
        );
        None
    }

    /// Find the end marker matching the layout of the start marker.
    pub fn locate_end(&self, screen: &GrayImage, identified: bool) -> Option<(u32, u32)> {
        let m = &self.markers;
        let found = if identified {
            self.find_marker(screen, "two-line end", &m.two_line_end)
                .or_else(|| {
                    self.find_marker(screen, "two-line end compressed", &m.two_line_end_compressed)
                })
        } else {
            self.find_marker(screen, "one-line end", &m.one_line_end)
        };

        if found.is_none() {
            error!(
                "Couldn't find unique control end, threshold is {}",
                self.threshold
            );
        }
        found
    }

    fn find_marker(
        &self,
        screen: &GrayImage,
        name: &str,
        marker: &GrayImage,
    ) -> Option<(u32, u32)> {
        let Some(hit) = best_match(screen, marker) else {
            debug!("Marker {} cannot be scored on this screenshot", name);
            return None;
        };

        debug!("Finding unique control {}: min_val={}", name, hit.score);
        (hit.score <= self.threshold).then_some(hit.loc)
    }

    /// Item artwork: the `ITEM_MAX_SIZE` box left of the start marker.
    pub fn crop_artwork(&self, screen: &RgbaImage, start: Anchor) -> RgbaImage {
        let (w, h) = ITEM_MAX_SIZE;
        let (x, y) = (start.loc.0 as i64, start.loc.1 as i64);
        crop_padded(screen, x - w as i64, y, x, y + h as i64)
    }

    /// Item title: between the markers, trimmed by a few pixels.
    pub fn crop_title(&self, screen: &RgbaImage, start: Anchor, end: (u32, u32)) -> RgbaImage {
        let (cw, ch) = if start.identified {
            self.markers.two_line.dimensions()
        } else {
            self.markers.one_line.dimensions()
        };
        let (sx, sy) = (start.loc.0 as i64, start.loc.1 as i64);
        let (ex, ey) = (end.0 as i64, end.1 as i64);

        crop_padded(
            screen,
            sx + cw as i64 - 6,
            sy + 4,
            ex + 6,
            ey + ch as i64 - 6,
        )
    }

    /// Run the full locate step on a screenshot.
    pub fn locate(&self, screen: &RgbaImage) -> Result<ItemRegions, MatchError> {
        self.check_resolution(screen.width(), screen.height())?;

        let gray = imageops::grayscale(screen);
        let start = self
            .locate_start(&gray)
            .ok_or(MatchError::AnchorNotFound(GuideEdge::Start))?;
        let end = self
            .locate_end(&gray, start.identified)
            .ok_or(MatchError::AnchorNotFound(GuideEdge::End))?;

        let artwork = self.crop_artwork(screen, start);
        debug!(
            "Unique item area has size: {}x{}px",
            artwork.width(),
            artwork.height()
        );

        Ok(ItemRegions {
            artwork,
            title: self.crop_title(screen, start, end),
            identified: start.identified,
        })
    }
}
