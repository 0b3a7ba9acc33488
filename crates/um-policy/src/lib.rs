use tracing::{error, info};
use um_catalog::ItemCatalog;
use um_result::{CroppedItemInfo, MatchError, MatchResult, MatchedBy};

mod best;
mod solaris;

pub use best::{best_result, distance_from_best, MatchingAlgorithm, ResultDistance};
pub use solaris::{classify_gem, SolarisGem, SOLARIS_CIRCLET_BASE};

/// Best template score above this means nothing matched
pub const THRESHOLD_DISCARD: f64 = 0.96;

/// Best and second-best results closer than this are too close to call
pub const THRESHOLD_RESULT_DISTANCE: f64 = 0.02;

/// Bases where template matching is unreliable and histograms decide
pub const HISTOGRAM_FORCED_BASES: &[&str] = &["Two-Stone Ring"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyThresholds {
    pub discard: f64,
    pub result_distance: f64,
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            discard: THRESHOLD_DISCARD,
            result_distance: THRESHOLD_RESULT_DISTANCE,
        }
    }
}

/// One way of turning candidate results into a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherPolicy {
    SolarisCirclet,
    HistogramForced,
    Default,
}

impl MatcherPolicy {
    /// Consultation order. `Default` accepts everything and must stay last.
    pub const CHAIN: [MatcherPolicy; 3] = [
        MatcherPolicy::SolarisCirclet,
        MatcherPolicy::HistogramForced,
        MatcherPolicy::Default,
    ];

    pub fn is_for(self, cropped: &CroppedItemInfo) -> bool {
        match self {
            MatcherPolicy::SolarisCirclet => cropped.base == SOLARIS_CIRCLET_BASE,
            MatcherPolicy::HistogramForced => {
                HISTOGRAM_FORCED_BASES.contains(&cropped.base.as_str())
            }
            MatcherPolicy::Default => true,
        }
    }
}

/// Picks the policy for an item and applies it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyChain {
    thresholds: PolicyThresholds,
}

impl PolicyChain {
    pub fn new(thresholds: PolicyThresholds) -> Self {
        Self { thresholds }
    }

    pub fn select(&self, cropped: &CroppedItemInfo) -> MatcherPolicy {
        MatcherPolicy::CHAIN
            .into_iter()
            .find(|p| p.is_for(cropped))
            .unwrap_or(MatcherPolicy::Default)
    }

    /// Choose the winning result among all scored candidates.
    pub fn decide(
        &self,
        results: &[MatchResult],
        cropped: &CroppedItemInfo,
        catalog: &ItemCatalog,
    ) -> Result<MatchResult, MatchError> {
        let policy = self.select(cropped);
        info!("Using matcher policy: {:?}", policy);

        match policy {
            MatcherPolicy::SolarisCirclet => {
                let threshold = self.thresholds.result_distance;
                match solaris::decide(results, cropped, catalog, threshold)? {
                    Some(result) => Ok(result),
                    None => self.decide_default(results),
                }
            }
            MatcherPolicy::HistogramForced => {
                let mut best = best_result(
                    results,
                    MatchingAlgorithm::Histogram,
                    self.thresholds.result_distance,
                )?;
                best.matched_by = MatchedBy::HistogramMatch;
                Ok(best)
            }
            MatcherPolicy::Default => self.decide_default(results),
        }
    }

    fn decide_default(&self, results: &[MatchResult]) -> Result<MatchResult, MatchError> {
        let best = best_result(
            results,
            MatchingAlgorithm::Default,
            self.thresholds.result_distance,
        )?;

        if best.min_val > self.thresholds.discard {
            error!(
                "Couldn't identify a unique item, even the best result was above the discard threshold (min_val={})",
                best.min_val
            );
            return Err(MatchError::InconclusiveMatch(format!(
                "best min_val {} is above {}",
                best.min_val, self.thresholds.discard
            )));
        }

        Ok(best)
    }
}
