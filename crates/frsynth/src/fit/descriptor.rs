//! Fit descriptors.

use crate::config::MAX_DECIMAL_PRECISION;

/// A fitted marginal distribution.
#[derive(Debug, Clone, PartialEq)]
pub enum FitDescriptor {
    /// Normal distribution with maximum-likelihood parameters.
    Gaussian { mean: f64, std: f64 },
    /// Piecewise-uniform distribution over contiguous buckets.
    Step(StepFit),
}

impl FitDescriptor {
    /// Name of the distribution in the emitted program.
    pub fn kind(&self) -> &'static str {
        match self {
            FitDescriptor::Gaussian { .. } => "gaussian",
            FitDescriptor::Step(_) => "step",
        }
    }

    /// Mean of the described distribution.
    pub fn mean(&self) -> f64 {
        match self {
            FitDescriptor::Gaussian { mean, .. } => *mean,
            FitDescriptor::Step(step) => step
                .buckets()
                .map(|b| 0.5 * (b.lower + b.upper) * b.probability)
                .sum(),
        }
    }
}

/// One bucket of a [`StepFit`]: mass `probability` spread over `(lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepBucket {
    pub lower: f64,
    pub upper: f64,
    pub probability: f64,
}

/// Histogram-shaped distribution.
///
/// Probabilities are held as integer units of `10^-precision`, so the
/// invariant "probabilities sum to exactly one" is checked on integers and
/// survives fixed-precision printing. Bucket bounds are stored as shared edges,
/// which makes consecutive buckets contiguous by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFit {
    /// `n_buckets + 1` increasing edges.
    edges: Vec<f64>,
    /// Probability of each bucket in units of `10^-precision`.
    units: Vec<u64>,
    precision: u32,
}

impl StepFit {
    /// Quantize per-bucket probabilities to `precision` decimals.
    ///
    /// Every bucket but the last is rounded to the nearest unit; the last one
    /// is recomputed as `1 - sum(others)`. If rounding pushed the others past
    /// one, the excess is taken from the largest of them. `precision` is
    /// capped at [`MAX_DECIMAL_PRECISION`].
    ///
    /// # Panics
    ///
    /// Panics if `edges.len() != probabilities.len() + 1` or there are no buckets.
    pub fn from_probabilities(edges: Vec<f64>, probabilities: &[f64], precision: u32) -> Self {
        let precision = precision.min(MAX_DECIMAL_PRECISION);
        assert!(!probabilities.is_empty(), "step fit needs at least one bucket");
        assert_eq!(
            edges.len(),
            probabilities.len() + 1,
            "edges length {} doesn't match n_buckets + 1 = {}",
            edges.len(),
            probabilities.len() + 1
        );

        let scale = Self::scale_for(precision);
        let n = probabilities.len();
        let mut units: Vec<u64> = probabilities[..n - 1]
            .iter()
            .map(|&p| (p.clamp(0.0, 1.0) * scale as f64).round() as u64)
            .collect();

        let mut others: u64 = units.iter().sum();
        if others > scale {
            let excess = others - scale;
            if let Some(largest) = units.iter_mut().max() {
                *largest -= excess.min(*largest);
            }
            others = units.iter().sum();
        }
        units.push(scale - others.min(scale));

        Self {
            edges,
            units,
            precision,
        }
    }

    #[inline]
    fn scale_for(precision: u32) -> u64 {
        10u64.pow(precision)
    }

    /// Number of buckets.
    #[inline]
    pub fn n_buckets(&self) -> usize {
        self.units.len()
    }

    /// Bucket edges (`n_buckets + 1`).
    #[inline]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Decimal precision of the probabilities.
    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Probabilities in units of `10^-precision`; they sum to `10^precision`.
    #[inline]
    pub fn probability_units(&self) -> &[u64] {
        &self.units
    }

    /// Probability of bucket `i`.
    #[inline]
    pub fn probability(&self, i: usize) -> f64 {
        self.units[i] as f64 / Self::scale_for(self.precision) as f64
    }

    /// Buckets in increasing order.
    pub fn buckets(&self) -> impl Iterator<Item = StepBucket> + '_ {
        (0..self.n_buckets()).map(move |i| StepBucket {
            lower: self.edges[i],
            upper: self.edges[i + 1],
            probability: self.probability(i),
        })
    }
}
