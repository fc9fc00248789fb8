//! Marginal distribution fitting.
//!
//! Given one column of values, [`fit`] picks between a Gaussian and a step
//! (histogram) distribution by one-sample Kolmogorov-Smirnov distance.
//!
//! # Key Types
//!
//! - [`FitDescriptor`]: `Gaussian { mean, std }` or `Step(StepFit)`
//! - [`StepFit`]: contiguous buckets with exact unit-sum probabilities
//! - [`FitError`]: Degenerate input

mod descriptor;
mod fitter;

pub use descriptor::{FitDescriptor, StepBucket, StepFit};
pub use fitter::{FitError, ScoredFit, fit, fit_scored};
