//! Compiler tuning parameters.
//!
//! All thresholds used by the fitter, the partition search and the emitters
//! live in [`CompilerParams`], which is passed explicitly into every stage.
//! Two compilations with different tuning can therefore run side by side.
//!
//! Parameters are grouped by concern:
//! - fitting: `max_step_buckets`, `decimal_precision`
//! - partitioning: `information_gain_thresh`, `partition_frac_thresh`,
//!   `partition_penalty`, `candidate_thresholds`, `max_cuts`, `entropy_bins`
//! - recursion: `max_depth`
//! - rule extraction: `literal_precision`, `mlp_output_offset`

// =============================================================================
// CompilerParams
// =============================================================================

/// Tuning for one compilation.
///
/// # Example
///
/// ```
/// use frsynth::CompilerParams;
///
/// // Depth-1 compilation (each column conditioned on at most one other).
/// let params = CompilerParams::default().with_max_depth(1);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerParams {
    /// Minimum information gain (nats) for a split to be accepted. Default: 0.125.
    pub information_gain_thresh: f64,

    /// Minimum fraction of the parent's rows each side of a split must hold. Default: 0.10.
    pub partition_frac_thresh: f64,

    /// Gain discount applied to every cut after the first on the same
    /// conditioning column. Cut `j` (1-based) must reach
    /// `information_gain_thresh * (1 + partition_penalty * (j - 1))`. Default: 0.33.
    pub partition_penalty: f64,

    /// Maximum depth of nested conditionals in the population model. Default: 2.
    pub max_depth: usize,

    /// Exclusive upper bound on step-fit bucket counts; `1..max_step_buckets` are tried. Default: 6.
    pub max_step_buckets: usize,

    /// Number of histogram buckets used for entropy estimates. Default: 25.
    pub entropy_bins: usize,

    /// Number of candidate thresholds spread over `mean ± std` of the conditioning column. Default: 5.
    pub candidate_thresholds: usize,

    /// Maximum number of cuts on one conditioning column. Default: 5.
    pub max_cuts: usize,

    /// Decimal places for probabilities and population-model literals. Default: 6.
    pub decimal_precision: u32,

    /// Decimal places for classifier weights, thresholds and offsets. Default: 4.
    ///
    /// Values below `0.5 * 10^-literal_precision` print as zero. Standard
    /// scaler factors (`1 / scale`) on wide-ranged features such as incomes
    /// are that small, so raise this for scaled pipelines.
    pub literal_precision: usize,

    /// Constant added to an MLP's output so it centers on the decision
    /// boundary. `None` omits the shift. Default: `Some(0.5)`.
    pub mlp_output_offset: Option<f64>,
}

/// Largest `decimal_precision`; `10^precision` probability units must fit a `u64`
/// and an `f64` mantissa.
pub const MAX_DECIMAL_PRECISION: u32 = 15;

impl Default for CompilerParams {
    fn default() -> Self {
        Self {
            information_gain_thresh: 0.125,
            partition_frac_thresh: 0.10,
            partition_penalty: 0.33,
            max_depth: 2,
            max_step_buckets: 6,
            entropy_bins: 25,
            candidate_thresholds: 5,
            max_cuts: 5,
            decimal_precision: 6,
            literal_precision: 4,
            mlp_output_offset: Some(0.5),
        }
    }
}

impl CompilerParams {
    /// Set the maximum conditional depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the information gain threshold.
    pub fn with_information_gain_thresh(mut self, thresh: f64) -> Self {
        self.information_gain_thresh = thresh;
        self
    }

    /// Set the minimum coverage fraction for each side of a split.
    pub fn with_partition_frac_thresh(mut self, frac: f64) -> Self {
        self.partition_frac_thresh = frac;
        self
    }

    /// Set the maximum number of cuts per conditioning column.
    pub fn with_max_cuts(mut self, max_cuts: usize) -> Self {
        self.max_cuts = max_cuts;
        self
    }

    /// Set the decimal places of probabilities and population literals.
    pub fn with_decimal_precision(mut self, precision: u32) -> Self {
        self.decimal_precision = precision;
        self
    }

    /// Set the decimal places of classifier literals.
    pub fn with_literal_precision(mut self, precision: usize) -> Self {
        self.literal_precision = precision;
        self
    }

    /// Set (or clear) the MLP output offset.
    pub fn with_mlp_output_offset(mut self, offset: Option<f64>) -> Self {
        self.mlp_output_offset = offset;
        self
    }

    /// Gain a cut must reach when it is the `cut`-th (1-based) on its column.
    #[inline]
    pub fn gain_thresh_for_cut(&self, cut: usize) -> f64 {
        let extra = cut.saturating_sub(1) as f64;
        self.information_gain_thresh * (1.0 + self.partition_penalty * extra)
    }

    /// Validate parameters.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> Result<(), ParamValidationError> {
        if self.information_gain_thresh.is_nan() {
            return Err(ParamValidationError::InvalidInformationGain(
                self.information_gain_thresh,
            ));
        }
        if !(0.0..0.5).contains(&self.partition_frac_thresh) {
            return Err(ParamValidationError::InvalidPartitionFrac(self.partition_frac_thresh));
        }
        if self.partition_penalty.is_nan() || self.partition_penalty < 0.0 {
            return Err(ParamValidationError::InvalidPenalty(self.partition_penalty));
        }
        if self.max_depth == 0 {
            return Err(ParamValidationError::InvalidMaxDepth);
        }
        if self.max_step_buckets < 2 {
            return Err(ParamValidationError::InvalidStepBuckets(self.max_step_buckets));
        }
        if self.entropy_bins == 0 {
            return Err(ParamValidationError::InvalidEntropyBins);
        }
        if self.candidate_thresholds == 0 {
            return Err(ParamValidationError::InvalidCandidates);
        }
        if self.decimal_precision == 0 || self.decimal_precision > MAX_DECIMAL_PRECISION {
            return Err(ParamValidationError::InvalidPrecision(self.decimal_precision));
        }
        Ok(())
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Parameter validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamValidationError {
    /// The gain threshold must be a number.
    #[error("information_gain_thresh must not be NaN, got {0}")]
    InvalidInformationGain(f64),

    /// Coverage fraction must be in [0, 0.5).
    #[error("partition_frac_thresh must be in [0, 0.5), got {0}")]
    InvalidPartitionFrac(f64),

    /// Penalty must be >= 0.
    #[error("partition_penalty must be >= 0, got {0}")]
    InvalidPenalty(f64),

    /// Depth must be >= 1.
    #[error("max_depth must be >= 1")]
    InvalidMaxDepth,

    /// At least one step-fit bucket count must be tried.
    #[error("max_step_buckets must be >= 2, got {0}")]
    InvalidStepBuckets(usize),

    /// Entropy histograms need at least one bin.
    #[error("entropy_bins must be >= 1")]
    InvalidEntropyBins,

    /// At least one candidate threshold is required.
    #[error("candidate_thresholds must be >= 1")]
    InvalidCandidates,

    /// Precision must be in 1..=15.
    #[error("decimal_precision must be in 1..=15, got {0}")]
    InvalidPrecision(u32),
}

// =============================================================================
// Tests
// =============================================================================
