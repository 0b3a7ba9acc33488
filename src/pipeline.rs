use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::Path;
use tracing::{info, warn};

use um_catalog::{CatalogOptions, ItemCatalog};
use um_policy::PolicyChain;
use um_result::{
    CroppedItemInfo, MatchError, MatchObserver, MatchResult, MatchedBy, NoopObserver,
};
use um_vision::{
    AnchorLocator, AnchorMarkers, ItemGenerator, ItemMatcher, OcrCorrections, OcrEngine,
    TesseractCli, TitleParser,
};

use crate::config::MatcherConfig;

/// Finds unique items in screenshots.
///
/// Everything is loaded up front and read-only afterwards, so one instance
/// can serve many threads. Per-call diagnostics go through a `MatchObserver`.
pub struct Matcher {
    config: MatcherConfig,
    catalog: ItemCatalog,
    locator: AnchorLocator,
    title_parser: TitleParser,
    item_matcher: ItemMatcher,
    policy: PolicyChain,
}

impl Matcher {
    /// Load all assets from the configured data directory, reading titles with tesseract.
    pub fn load(config: MatcherConfig) -> Result<Self> {
        let ocr = TesseractCli::new(&config.tesseract_cmd);
        Self::with_ocr(config, Box::new(ocr))
    }

    /// Load all assets, reading titles with the given OCR engine.
    pub fn with_ocr(config: MatcherConfig, ocr: Box<dyn OcrEngine>) -> Result<Self> {
        let data_dir = config.data_dir.clone();

        let catalog = ItemCatalog::load(
            &data_dir,
            CatalogOptions {
                ignore_non_global: config.ignore_non_global_items,
            },
        )
        .context("Failed to load item catalog")?;
        let generator = ItemGenerator::load(&data_dir)?;
        let markers = AnchorMarkers::load(&data_dir)?;
        let corrections = OcrCorrections::load_or_default(&data_dir.join("corrections.json"))?;

        let matcher = Self {
            locator: AnchorLocator::new(
                markers,
                config.thresholds.control,
                config.allow_non_full_hd,
            ),
            title_parser: TitleParser::new(ocr, corrections, config.find_by_name_raise),
            item_matcher: ItemMatcher::new(generator),
            policy: PolicyChain::new(config.thresholds.policy()),
            catalog,
            config,
        };

        info!(
            "Matcher ready: {} items, {} bases from {}",
            matcher.catalog.len(),
            matcher.catalog.bases().len(),
            data_dir.display()
        );
        Ok(matcher)
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Locate the item tooltip in a screenshot file and read its title.
    pub fn find_unique(&self, screenshot: &Path) -> Result<CroppedItemInfo, MatchError> {
        self.find_unique_image(&load_screenshot(screenshot)?)
    }

    /// Locate the item tooltip in a decoded screenshot and read its title.
    pub fn find_unique_image(&self, screen: &RgbaImage) -> Result<CroppedItemInfo, MatchError> {
        let regions = self.locator.locate(screen)?;
        let title = self
            .title_parser
            .parse_title(&self.catalog, &regions.title, regions.identified)?;

        Ok(CroppedItemInfo {
            image: regions.artwork,
            base: title.base,
            name: title.name,
            identified: regions.identified,
        })
    }

    /// Identify the unique item in a screenshot file.
    pub fn find_item(&self, screenshot: &Path) -> Result<MatchResult, MatchError> {
        self.find_item_observed(screenshot, &mut NoopObserver)
    }

    /// Identify the unique item in a screenshot file, reporting intermediate data.
    pub fn find_item_observed(
        &self,
        screenshot: &Path,
        observer: &mut dyn MatchObserver,
    ) -> Result<MatchResult, MatchError> {
        info!("Finding item in screenshot: {}", screenshot.display());
        self.find_item_image(&load_screenshot(screenshot)?, observer)
    }

    /// Identify the unique item in a decoded screenshot.
    pub fn find_item_image(
        &self,
        screen: &RgbaImage,
        observer: &mut dyn MatchObserver,
    ) -> Result<MatchResult, MatchError> {
        let cropped = self.find_unique_image(screen)?;
        observer.unique_image(&cropped.image);

        if self.config.find_item_by_name && !cropped.name.is_empty() {
            let mut item = self.catalog.get(&cropped.name)?;
            if let Some(parent) = &item.alias {
                warn!(
                    "Found aliased item: {}, recording parent: {}",
                    item.name, parent
                );
                item = self.catalog.get(parent)?;
            }

            info!("Found identified item by name: {}", item.name);
            return Ok(MatchResult::decided(
                item.clone(),
                MatchedBy::ItemName,
                cropped.identified,
            ));
        }

        let candidates = self.catalog.filter_by_base(&cropped.base);
        info!("Searching through {} item base variants", candidates.len());

        match candidates.as_slice() {
            [] => return Err(MatchError::NoCandidates(cropped.base)),
            [only] => {
                info!("Only one possible unique for base {}: {}", only.base, only.name);
                return Ok(MatchResult::decided(
                    (*only).clone(),
                    MatchedBy::OnlyUniqueForBase,
                    cropped.identified,
                ));
            }
            _ => {}
        }

        let mut results = Vec::with_capacity(candidates.len());
        let mut first_fault = None;
        for item in candidates {
            match self.item_matcher.check_one(&cropped.image, item, observer) {
                Ok(result) => results.push(result),
                Err(e) if e.is_candidate_fault() => {
                    warn!("Skipping candidate {}: {}", item.name, e);
                    first_fault.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }

        if results.is_empty() {
            return Err(first_fault.unwrap_or(MatchError::NoCandidates(cropped.base)));
        }
        observer.results(&results);

        let mut best = self.policy.decide(&results, &cropped, &self.catalog)?;

        let aliases = self.catalog.aliases_of(&best.item);
        if !aliases.is_empty() {
            let names: Vec<&str> = aliases.iter().map(|a| a.name.as_str()).collect();
            warn!(
                "Found aliased item: {}, aliases: {}",
                best.item.name,
                names.join(", ")
            );
        }

        best.identified = Some(cropped.identified);
        info!("Found item: {} ({})", best.item.name, best.matched_by);
        Ok(best)
    }
}

fn load_screenshot(path: &Path) -> Result<RgbaImage, MatchError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| MatchError::Image {
            path: path.to_path_buf(),
            source,
        })
}
