//! Threshold search and stepwise refinement.

use crate::config::CompilerParams;
use crate::fit::{FitDescriptor, FitError, fit};
use crate::stats::{Histogram, linspace, mean, std_dev};

use super::range::PartitionRange;

// =============================================================================
// Results
// =============================================================================

/// One side of an accepted split.
#[derive(Debug, Clone, PartialEq)]
pub struct Side {
    /// Positions (into the searched slices) of the rows on this side.
    pub positions: Vec<usize>,
    /// Fit of the subject column over those rows.
    pub fit: FitDescriptor,
}

/// Accepted single-threshold split.
///
/// Rows with `conditioning <= threshold` go to `below`, the rest to `above`.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub threshold: f64,
    /// Information gain (nats) of the subject column.
    pub gain: f64,
    pub below: Side,
    pub above: Side,
}

/// One range of a stepwise refinement.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedBucket {
    pub range: PartitionRange,
    pub positions: Vec<usize>,
    pub fit: FitDescriptor,
}

/// Result of stepwise refinement: `k` sorted thresholds and `k + 1` buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    thresholds: Vec<f64>,
    buckets: Vec<RefinedBucket>,
}

impl Refinement {
    /// Cut points in increasing order.
    #[inline]
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Buckets in increasing range order, starting at `(-inf, t_1]`.
    #[inline]
    pub fn buckets(&self) -> &[RefinedBucket] {
        &self.buckets
    }

    /// Consume into the bucket list.
    pub fn into_buckets(self) -> Vec<RefinedBucket> {
        self.buckets
    }

    #[inline]
    pub fn n_cuts(&self) -> usize {
        self.thresholds.len()
    }
}

// =============================================================================
// Gain
// =============================================================================

/// Entropy of `values` from an equal-width histogram with `bins` buckets.
pub fn column_entropy(values: &[f64], bins: usize) -> f64 {
    Histogram::equal_width(values, bins).entropy()
}

/// Information gain of `subject` from splitting on `conditioning <= threshold`.
///
/// Both sides are binned on the unsplit subject's bucket edges, so the result
/// is the drop in conditional entropy and is never negative (up to rounding).
///
/// # Panics
///
/// Panics if the slices have different lengths.
pub fn information_gain(subject: &[f64], conditioning: &[f64], threshold: f64, bins: usize) -> f64 {
    assert_eq!(subject.len(), conditioning.len(), "column lengths differ");
    let positions: Vec<usize> = (0..subject.len()).collect();
    let parent = Histogram::equal_width(subject, bins);
    let (below, above): (Vec<usize>, Vec<usize>) = positions
        .iter()
        .copied()
        .partition(|&p| conditioning[p] <= threshold);
    gain_on_parent_edges(&parent, subject, &below, &above)
}

fn gain_on_parent_edges(parent: &Histogram, subject: &[f64], below: &[usize], above: &[usize]) -> f64 {
    let n = (below.len() + above.len()) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let side_entropy = |side: &[usize]| {
        let values: Vec<f64> = side.iter().map(|&p| subject[p]).collect();
        Histogram::with_edges(&values, parent.edges.clone()).entropy()
    };
    let weighted = below.len() as f64 / n * side_entropy(below) + above.len() as f64 / n * side_entropy(above);
    parent.entropy() - weighted
}

// =============================================================================
// Search
// =============================================================================

struct Cut {
    threshold: f64,
    gain: f64,
    below: Vec<usize>,
    above: Vec<usize>,
}

/// Best accepted cut of the rows at `positions`, if any.
///
/// Candidates are spread over `mean ± std` of the conditioning values of those
/// rows. A candidate is rejected when a side is empty, holds less than
/// `partition_frac_thresh` of `coverage_base` rows, or gains less than
/// `gain_thresh`.
fn best_cut(
    subject: &[f64],
    conditioning: &[f64],
    positions: &[usize],
    coverage_base: usize,
    params: &CompilerParams,
    gain_thresh: f64,
) -> Option<Cut> {
    let n = positions.len();
    if n < 2 {
        return None;
    }

    let subject_values: Vec<f64> = positions.iter().map(|&p| subject[p]).collect();
    let cond_values: Vec<f64> = positions.iter().map(|&p| conditioning[p]).collect();
    let parent = Histogram::equal_width(&subject_values, params.entropy_bins);
    let min_side = params.partition_frac_thresh * coverage_base as f64;

    let mu = mean(&cond_values);
    let sigma = std_dev(&cond_values);

    let mut best: Option<Cut> = None;
    for threshold in linspace(mu - sigma, mu + sigma, params.candidate_thresholds) {
        let (below, above): (Vec<usize>, Vec<usize>) = positions
            .iter()
            .copied()
            .partition(|&p| conditioning[p] <= threshold);

        if below.is_empty() || above.is_empty() {
            continue;
        }
        if (below.len() as f64) < min_side || (above.len() as f64) < min_side {
            continue;
        }

        let gain = gain_on_parent_edges(&parent, subject, &below, &above);
        if gain < gain_thresh {
            continue;
        }
        if best.as_ref().is_none_or(|b| gain > b.gain) {
            best = Some(Cut {
                threshold,
                gain,
                below,
                above,
            });
        }
    }

    if let Some(cut) = &best {
        tracing::trace!(threshold = cut.threshold, gain = cut.gain, rows = n, "cut accepted");
    }
    best
}

fn fit_positions(subject: &[f64], positions: &[usize], params: &CompilerParams) -> Result<FitDescriptor, FitError> {
    let values: Vec<f64> = positions.iter().map(|&p| subject[p]).collect();
    fit(&values, params)
}

/// Search a single threshold of `conditioning` that splits `subject`.
///
/// Returns `Ok(None)` when no candidate passes the coverage and gain checks.
/// Among accepted candidates the highest gain wins; the first one wins ties.
///
/// # Errors
///
/// Returns [`FitError`] if a side cannot be fitted (non-finite subject values).
///
/// # Panics
///
/// Panics if the slices have different lengths.
pub fn partition(subject: &[f64], conditioning: &[f64], params: &CompilerParams) -> Result<Option<Split>, FitError> {
    assert_eq!(subject.len(), conditioning.len(), "column lengths differ");
    let positions: Vec<usize> = (0..subject.len()).collect();

    let n = positions.len();
    let Some(cut) = best_cut(subject, conditioning, &positions, n, params, params.gain_thresh_for_cut(1)) else {
        return Ok(None);
    };

    let below_fit = fit_positions(subject, &cut.below, params)?;
    let above_fit = fit_positions(subject, &cut.above, params)?;
    Ok(Some(Split {
        threshold: cut.threshold,
        gain: cut.gain,
        below: Side {
            positions: cut.below,
            fit: below_fit,
        },
        above: Side {
            positions: cut.above,
            fit: above_fit,
        },
    }))
}

/// Stepwise refinement into up to `max_cuts` cuts.
///
/// Starts with one bucket holding every row. Each round picks the bucket whose
/// subject values have the highest entropy (first on ties) and searches a cut
/// restricted to its rows. Cut `j` must reach
/// [`CompilerParams::gain_thresh_for_cut`]`(j)`, and both sides must hold at
/// least `partition_frac_thresh` of *all* rows, so no bucket of the result is
/// smaller than that. The first failed round ends the refinement.
///
/// Returns `Ok(None)` when not even the first cut is accepted.
///
/// # Errors
///
/// Returns [`FitError`] if a bucket cannot be fitted.
///
/// # Panics
///
/// Panics if the slices have different lengths.
pub fn refine(subject: &[f64], conditioning: &[f64], params: &CompilerParams) -> Result<Option<Refinement>, FitError> {
    assert_eq!(subject.len(), conditioning.len(), "column lengths differ");

    let mut ranges = vec![PartitionRange::unbounded()];
    let mut members: Vec<Vec<usize>> = vec![(0..subject.len()).collect()];
    let mut thresholds: Vec<f64> = Vec::new();

    for cut_no in 1..=params.max_cuts {
        let Some(target) = highest_entropy_bucket(subject, &members, params.entropy_bins) else {
            break;
        };
        let gain_thresh = params.gain_thresh_for_cut(cut_no);
        let Some(cut) = best_cut(subject, conditioning, &members[target], subject.len(), params, gain_thresh) else {
            break;
        };

        let (below_range, above_range) = ranges[target].split_at(cut.threshold);
        ranges[target] = above_range;
        ranges.insert(target, below_range);
        members[target] = cut.above;
        members.insert(target, cut.below);
        thresholds.insert(target, cut.threshold);
    }

    if thresholds.is_empty() {
        return Ok(None);
    }

    let mut buckets = Vec::with_capacity(ranges.len());
    for (range, positions) in ranges.into_iter().zip(members) {
        let fit = fit_positions(subject, &positions, params)?;
        buckets.push(RefinedBucket { range, positions, fit });
    }

    tracing::debug!(cuts = thresholds.len(), "refinement finished");
    Ok(Some(Refinement { thresholds, buckets }))
}

fn highest_entropy_bucket(subject: &[f64], members: &[Vec<usize>], bins: usize) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, positions) in members.iter().enumerate() {
        let values: Vec<f64> = positions.iter().map(|&p| subject[p]).collect();
        let entropy = column_entropy(&values, bins);
        if best.is_none_or(|(_, h)| entropy > h) {
            best = Some((idx, entropy));
        }
    }
    best.map(|(idx, _)| idx)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::data::{gaussian_column, uniform_column};

    /// Subject jumps by `shift` wherever `conditioning > cut`.
    fn shifted(conditioning: &[f64], cut: f64, shift: f64, seed: u64) -> Vec<f64> {
        let noise = gaussian_column(conditioning.len(), 0.0, 1.0, seed);
        conditioning
            .iter()
            .zip(noise)
            .map(|(&c, e)| if c > cut { shift + e } else { e })
            .collect()
    }

    #[test]
    fn dependent_subject_is_split() {
        let cond = gaussian_column(1000, 0.0, 1.0, 1);
        let subject = shifted(&cond, 0.0, 50.0, 2);
        let params = CompilerParams::default();

        let split = partition(&subject, &cond, &params).unwrap().expect("split");
        // Candidates are mean - std, ..., mean + std; the middle one sits at the jump.
        assert!(split.threshold.abs() < 0.1, "threshold {}", split.threshold);
        assert!(split.gain > params.information_gain_thresh);
        assert_eq!(split.below.positions.len() + split.above.positions.len(), 1000);
        assert!(split.above.fit.mean() - split.below.fit.mean() > 40.0);
    }

    #[test]
    fn independent_subject_is_not_split() {
        let cond = gaussian_column(1000, 0.0, 1.0, 3);
        let subject = gaussian_column(1000, 5.0, 2.0, 4);
        assert!(partition(&subject, &cond, &CompilerParams::default()).unwrap().is_none());
    }

    #[test]
    fn sides_respect_coverage() {
        let cond = gaussian_column(800, 0.0, 1.0, 5);
        let subject = shifted(&cond, 0.8, 30.0, 6);
        let params = CompilerParams::default().with_partition_frac_thresh(0.25);

        if let Some(split) = partition(&subject, &cond, &params).unwrap() {
            let n = subject.len() as f64;
            assert!(split.below.positions.len() as f64 >= 0.25 * n);
            assert!(split.above.positions.len() as f64 >= 0.25 * n);
        }
    }

    #[test]
    fn gain_is_not_negative() {
        let cond = uniform_column(500, -1.0, 1.0, 7);
        let subject = uniform_column(500, 0.0, 10.0, 8);
        for t in [-0.5, 0.0, 0.5] {
            assert!(information_gain(&subject, &cond, t, 25) >= -1e-12);
        }
    }

    #[test]
    fn refinement_orders_ranges_and_covers_rows() {
        let cond = uniform_column(1500, 0.0, 30.0, 9);
        let noise = gaussian_column(1500, 0.0, 1.0, 10);
        let subject: Vec<f64> = cond
            .iter()
            .zip(&noise)
            .map(|(&c, e)| e + 100.0 * (c / 10.0).floor().min(2.0))
            .collect();

        let refinement = refine(&subject, &cond, &CompilerParams::default()).unwrap().expect("refinement");
        let buckets = refinement.buckets();
        assert_eq!(buckets.len(), refinement.n_cuts() + 1);
        assert!(refinement.thresholds().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(buckets[0].range.lower(), f64::NEG_INFINITY);
        assert_eq!(buckets[buckets.len() - 1].range.upper(), f64::INFINITY);
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].range.upper(), pair[1].range.lower());
        }

        let total: usize = buckets.iter().map(|b| b.positions.len()).sum();
        assert_eq!(total, 1500);
        for bucket in buckets {
            assert!(bucket.positions.iter().all(|&p| bucket.range.contains(cond[p])));
        }
    }

    #[test]
    fn single_cut_refinement_matches_partition() {
        let cond = gaussian_column(600, 0.0, 1.0, 11);
        let subject = shifted(&cond, 0.0, 50.0, 12);
        let params = CompilerParams::default().with_max_cuts(1);

        let split = partition(&subject, &cond, &params).unwrap().expect("split");
        let refinement = refine(&subject, &cond, &params).unwrap().expect("refinement");
        assert_eq!(refinement.thresholds(), &[split.threshold]);
        assert_eq!(refinement.buckets()[0].positions, split.below.positions);
        assert_eq!(refinement.buckets()[1].fit, split.above.fit);
    }

    #[test]
    fn zero_cuts_means_no_refinement() {
        let cond = gaussian_column(200, 0.0, 1.0, 13);
        let subject = shifted(&cond, 0.0, 50.0, 14);
        let params = CompilerParams::default().with_max_cuts(0);
        assert!(refine(&subject, &cond, &params).unwrap().is_none());
    }
}
