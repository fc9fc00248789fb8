//! Value ranges over a conditioning column.

use std::fmt;

/// Half-open interval `(lower, upper]` over a conditioning column.
///
/// The outermost ranges of a partition use `-inf` / `+inf` bounds, so the
/// ranges of one partition always cover the whole real line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionRange {
    lower: f64,
    upper: f64,
}

impl PartitionRange {
    /// Create `(lower, upper]`.
    ///
    /// # Panics
    ///
    /// Panics if `lower >= upper` or either bound is NaN.
    pub fn new(lower: f64, upper: f64) -> Self {
        assert!(
            lower < upper,
            "partition range must be non-empty, got ({lower}, {upper}]"
        );
        Self { lower, upper }
    }

    /// `(-inf, +inf]`, the range of an unsplit bucket.
    pub fn unbounded() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Whether `value` falls into `(lower, upper]`.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.lower < value && value <= self.upper
    }

    /// Split at `threshold` into `(lower, threshold]` and `(threshold, upper]`.
    pub fn split_at(&self, threshold: f64) -> (Self, Self) {
        (
            Self::new(self.lower, threshold),
            Self::new(threshold, self.upper),
        )
    }
}

impl fmt::Display for PartitionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}]", self.lower, self.upper)
    }
}
