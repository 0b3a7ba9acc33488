use image::{imageops, GrayImage, RgbaImage};
use imageproc::template_matching::{match_template, MatchTemplateMethod};
use tracing::{debug, error, info};
use um_catalog::Item;
use um_result::{MatchError, MatchObserver, MatchResult, MatchedBy};

use crate::generator::ItemGenerator;
use crate::histogram::HsHistogram;
use crate::image_ops::crop_padded;

/// Score used when no window of the correlation map is defined
/// (e.g. a fully black template over a fully black crop).
const UNDEFINED_SCORE: f64 = 1.0;

/// Best position of a template inside an image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    /// Normalized squared difference, 0 is a perfect match
    pub score: f64,
    pub loc: (u32, u32),
}

/// Slide `template` over `image` and return the lowest normalized squared
/// difference. Non-finite scores are skipped.
///
/// Returns None when the template does not fit into the image or no
/// position produced a finite score.
pub fn best_match(image: &GrayImage, template: &GrayImage) -> Option<TemplateMatch> {
    let (iw, ih) = image.dimensions();
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > iw || th > ih {
        return None;
    }

    let scores = match_template(image, template, MatchTemplateMethod::SumOfSquaredErrorsNormalized);

    let mut best: Option<TemplateMatch> = None;
    for (x, y, px) in scores.enumerate_pixels() {
        let score = px[0] as f64;
        if !score.is_finite() {
            continue;
        }
        if best.map_or(true, |b| score < b.score) {
            best = Some(TemplateMatch { score, loc: (x, y) });
        }
    }
    best
}

/// Keep only the part of the artwork an item of this footprint covers:
/// right-aligned horizontally, top-aligned vertically.
pub fn crop_by_dimensions(image: &RgbaImage, item: &Item) -> RgbaImage {
    if !item.is_smaller_than_full() {
        return image.clone();
    }

    let (w, h) = (image.width() as f64, image.height() as f64);
    let left = (w * (1.0 - item.width as f64 / Item::MAX_WIDTH as f64)) as i64;
    let bottom = (h * item.height as f64 / Item::MAX_HEIGHT as f64) as i64;
    debug!("Cropping artwork to {}x{} cells", item.width, item.height);

    crop_padded(image, left, 0, image.width() as i64, bottom)
}

/// Scores cropped artwork against the generated templates of one item.
pub struct ItemMatcher {
    generator: ItemGenerator,
}

impl ItemMatcher {
    pub fn new(generator: ItemGenerator) -> Self {
        Self { generator }
    }

    /// Check the artwork against every template variant of `item` and return
    /// the variant with the lowest template-match score.
    pub fn check_one(
        &self,
        image: &RgbaImage,
        item: &Item,
        observer: &mut dyn MatchObserver,
    ) -> Result<MatchResult, MatchError> {
        let icon = image::open(&item.icon)
            .map_err(|source| MatchError::Image {
                path: item.icon.clone(),
                source,
            })?
            .to_rgba8();

        let variants = self.generator.variants(&icon, item)?;
        info!("Item {} has {} variant(s)", item.name, variants.len());

        let image = crop_by_dimensions(image, item);
        observer.candidate_image(item, &image);

        let screen = imageops::grayscale(&image);
        let hist_base = HsHistogram::from_image(&image);

        let mut results = Vec::with_capacity(variants.len());
        for template in variants {
            let (tw, th) = template.image.dimensions();
            if tw > image.width() || th > image.height() {
                error!(
                    "Template image is larger than unique item: {}x{}px vs {}x{}px",
                    tw,
                    th,
                    image.width(),
                    image.height()
                );
                return Err(MatchError::InvalidTemplateDimensions {
                    template_width: tw,
                    template_height: th,
                    width: image.width(),
                    height: image.height(),
                });
            }

            let hist_val = hist_base.bhattacharyya(&HsHistogram::from_image(&template.image));
            debug!("Comparing histograms, hist_val={}", hist_val);

            let gray = imageops::grayscale(&template.image);
            let found = best_match(&screen, &gray).unwrap_or(TemplateMatch {
                score: UNDEFINED_SCORE,
                loc: (0, 0),
            });
            debug!("Sockets: {}, min_val: {}", template.sockets, found.score);

            results.push(MatchResult {
                item: item.clone(),
                loc: found.loc,
                identified: None,
                matched_by: MatchedBy::TemplateMatch,
                min_val: found.score,
                hist_val,
                template: Some(template),
            });
        }

        results
            .into_iter()
            .min_by(|a, b| a.min_val.total_cmp(&b.min_val))
            .ok_or_else(|| MatchError::InconclusiveMatch(format!("no templates for {}", item.name)))
    }
}
