//! Statistical kernels shared by the fitter and the partition search.
//!
//! Everything here works on plain `f64` slices. Histograms follow numpy's
//! equal-width convention (the last bin is closed on the right) and entropy
//! follows scipy's natural-log convention, so fits agree with values computed
//! by the usual Python tooling on the same data.

use std::cmp::Ordering;
use std::f64::consts::SQRT_2;

// =============================================================================
// Moments
// =============================================================================

/// Arithmetic mean. Returns `f64::NAN` for an empty slice.
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (`ddof = 0`).
///
/// This is the maximum-likelihood estimate used for Gaussian fits.
/// Returns `f64::NAN` for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    let mu = mean(values);
    if mu.is_nan() {
        return f64::NAN;
    }
    let var = values.iter().map(|&v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// `n` evenly spaced values over `[start, stop]`, both ends included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

// =============================================================================
// Histograms
// =============================================================================

/// Equal-width histogram: bin counts plus the `n_bins + 1` bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub counts: Vec<usize>,
    pub edges: Vec<f64>,
}

impl Histogram {
    /// Build an equal-width histogram over the observed range of `values`.
    ///
    /// A constant column gets the range `[v - 0.5, v + 0.5]` and an empty one
    /// gets `[0, 1]`, matching numpy.
    pub fn equal_width(values: &[f64], n_bins: usize) -> Self {
        debug_assert!(n_bins > 0, "histogram needs at least one bin");
        let (lo, hi) = match value_range(values) {
            None => (0.0, 1.0),
            Some((lo, hi)) if lo == hi => (lo - 0.5, hi + 0.5),
            Some(range) => range,
        };
        let edges = linspace(lo, hi, n_bins + 1);
        Self::with_edges(values, edges)
    }

    /// Count `values` into the bins described by `edges`.
    ///
    /// Values outside `[edges[0], edges[last]]` are ignored.
    pub fn with_edges(values: &[f64], edges: Vec<f64>) -> Self {
        let n_bins = edges.len().saturating_sub(1);
        let mut counts = vec![0usize; n_bins];
        if n_bins == 0 {
            return Self { counts, edges };
        }
        let lo = edges[0];
        let hi = edges[n_bins];
        let width = hi - lo;
        for &v in values {
            if !(lo..=hi).contains(&v) {
                continue;
            }
            let mut bin = (((v - lo) / width) * n_bins as f64) as usize;
            bin = bin.min(n_bins - 1);
            // Float rounding can put a value one bin off its edges.
            if v < edges[bin] && bin > 0 {
                bin -= 1;
            } else if bin + 1 < n_bins && v >= edges[bin + 1] {
                bin += 1;
            }
            counts[bin] += 1;
        }
        Self { counts, edges }
    }

    #[inline]
    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    /// Total number of counted values.
    #[inline]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Counts normalized by `n`, the number of rows the histogram describes.
    pub fn probabilities(&self, n: usize) -> Vec<f64> {
        if n == 0 {
            return vec![0.0; self.counts.len()];
        }
        self.counts.iter().map(|&c| c as f64 / n as f64).collect()
    }

    /// Shannon entropy (natural log) of the normalized counts.
    pub fn entropy(&self) -> f64 {
        entropy(&self.probabilities(self.total()))
    }
}

/// `(min, max)` of the slice, or `None` when it is empty.
pub fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

// =============================================================================
// Entropy
// =============================================================================

/// Natural-log Shannon entropy of a discrete distribution.
///
/// The input is renormalized to sum to one and zero entries are skipped.
/// An empty or all-zero input has entropy zero.
pub fn entropy(probabilities: &[f64]) -> f64 {
    let total: f64 = probabilities.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    probabilities
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| {
            let q = p / total;
            -q * q.ln()
        })
        .sum()
}

// =============================================================================
// Distribution functions
// =============================================================================

/// Error function, Abramowitz & Stegun 7.1.26 (absolute error below 1.5e-7).
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();

    sign * y
}

/// CDF of `N(mean, std^2)` at `x`.
#[inline]
pub fn normal_cdf(x: f64, mean: f64, std: f64) -> f64 {
    0.5 * (1.0 + erf((x - mean) / (std * SQRT_2)))
}

/// Piecewise-linear CDF of a histogram given by `edges` and per-bin `probabilities`.
///
/// Mass is spread uniformly inside each bin, so the CDF interpolates linearly
/// between edges and is flat outside the histogram range.
pub fn step_cdf(x: f64, edges: &[f64], probabilities: &[f64]) -> f64 {
    let mut cdf = 0.0;
    for (i, &p) in probabilities.iter().enumerate() {
        let (lo, hi) = (edges[i], edges[i + 1]);
        if lo >= x {
            break;
        }
        if x >= hi {
            cdf += p;
        } else {
            cdf += (x - lo) / (hi - lo) * p;
        }
    }
    cdf
}

/// One-sample Kolmogorov-Smirnov statistic of `values` against `cdf`.
///
/// `D = max_i max(i/n - F(x_(i)), F(x_(i)) - (i-1)/n)` over the sorted sample.
/// Returns `f64::NAN` for an empty sample.
pub fn ks_distance<F>(values: &[f64], cdf: F) -> f64
where
    F: Fn(f64) -> f64,
{
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let n = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let f = cdf(x);
            let d_plus = (i + 1) as f64 / n - f;
            let d_minus = f - i as f64 / n;
            d_plus.max(d_minus)
        })
        .fold(0.0, f64::max)
}

// =============================================================================
// Tests
// =============================================================================
