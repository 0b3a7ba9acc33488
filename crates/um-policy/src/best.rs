use tracing::{debug, error, warn};
use um_result::{MatchError, MatchResult, MatchedBy};

/// How the best of several candidate results is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingAlgorithm {
    /// Lowest template score, switching to histograms when scores tie
    Default,
    /// Lowest histogram distance
    Histogram,
}

/// Separation between the best and second-best result on both measures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultDistance {
    pub min_val: f64,
    pub hist_val: f64,
}

/// Compute how far apart the two best results are.
/// With fewer than two results both distances are 1.0.
pub fn distance_from_best(results: &[MatchResult], threshold: f64) -> ResultDistance {
    if results.len() <= 1 {
        return ResultDistance {
            min_val: 1.0,
            hist_val: 1.0,
        };
    }

    let gap = |values: Vec<f64>| {
        let mut values = values;
        values.sort_by(f64::total_cmp);
        (values[0] - values[1]).abs()
    };

    let distance = ResultDistance {
        min_val: gap(results.iter().map(|r| r.min_val).collect()),
        hist_val: gap(results.iter().map(|r| r.hist_val).collect()),
    };

    if distance.min_val < threshold {
        warn!("min_val distance too low: {}", distance.min_val);
    }
    if distance.hist_val < threshold {
        warn!("hist_val distance too low: {}", distance.hist_val);
    }

    if distance.min_val < distance.hist_val {
        debug!("Histogram comparison seems to be more precise than template matching");
    } else {
        debug!("Template matching seems to be more precise than histogram comparison");
    }

    distance
}

/// Pick the best result with the given algorithm.
///
/// With `Default`, a tie on template scores hands the decision to the
/// histograms; if those are too close as well, the match is inconclusive.
pub fn best_result(
    results: &[MatchResult],
    algorithm: MatchingAlgorithm,
    threshold: f64,
) -> Result<MatchResult, MatchError> {
    debug!("Matching algorithm: {:?}", algorithm);

    let distance = distance_from_best(results, threshold);
    let mut algorithm = algorithm;
    let mut switched = false;

    if algorithm == MatchingAlgorithm::Default && distance.min_val <= f64::EPSILON {
        let tied_hist_gap = tied_pair_hist_gap(results);
        debug!("hist_val distance between tied results: {}", tied_hist_gap);
        if tied_hist_gap < threshold {
            let msg = "Neither template matching nor histogram comparison is accurate enough";
            error!("{}", msg);
            return Err(MatchError::InconclusiveMatch(msg.to_string()));
        }

        warn!("Switching matching algorithm to histogram because dist_min_val=0");
        algorithm = MatchingAlgorithm::Histogram;
        switched = true;
    }

    let best = match algorithm {
        MatchingAlgorithm::Histogram => lowest_by(results, |r| r.hist_val),
        MatchingAlgorithm::Default => lowest_by(results, |r| r.min_val),
    };

    let mut best = best
        .cloned()
        .ok_or_else(|| MatchError::InconclusiveMatch("no results to choose from".to_string()))?;
    if switched {
        best.matched_by = MatchedBy::HistogramMatch;
    }
    Ok(best)
}

/// Histogram gap between the two results with the lowest template scores.
fn tied_pair_hist_gap(results: &[MatchResult]) -> f64 {
    let mut ranked: Vec<&MatchResult> = results.iter().collect();
    ranked.sort_by(|a, b| a.min_val.total_cmp(&b.min_val));
    match ranked.as_slice() {
        [first, second, ..] => (first.hist_val - second.hist_val).abs(),
        _ => 1.0,
    }
}

/// First result with the lowest key.
fn lowest_by(
    results: &[MatchResult],
    key: impl Fn(&MatchResult) -> f64,
) -> Option<&MatchResult> {
    results.iter().min_by(|a, b| key(a).total_cmp(&key(b)))
}
