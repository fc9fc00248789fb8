//! Gaussian vs. step selection.

use crate::config::CompilerParams;
use crate::stats::{Histogram, ks_distance, mean, normal_cdf, std_dev, step_cdf};

use super::descriptor::{FitDescriptor, StepFit};

/// Errors for inputs that cannot be fitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("cannot fit an empty column")]
    Empty,
    #[error("non-finite value {value} at row {row}")]
    NonFinite { row: usize, value: f64 },
}

/// A fit together with its goodness-of-fit distance (smaller is better).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFit {
    pub fit: FitDescriptor,
    pub distance: f64,
}

/// Fit the best marginal distribution to `values`.
///
/// # Errors
///
/// Returns [`FitError`] for empty input or non-finite values.
pub fn fit(values: &[f64], params: &CompilerParams) -> Result<FitDescriptor, FitError> {
    fit_scored(values, params).map(|scored| scored.fit)
}

/// Like [`fit`], also returning the winning KS distance.
///
/// The Gaussian candidate uses the maximum-likelihood mean and standard
/// deviation. Step candidates use `1..max_step_buckets` equal-width buckets;
/// the first bucket count with the smallest distance is kept. The Gaussian
/// wins ties. A zero-variance column has no Gaussian candidate and becomes a
/// single-bucket step.
pub fn fit_scored(values: &[f64], params: &CompilerParams) -> Result<ScoredFit, FitError> {
    if values.is_empty() {
        return Err(FitError::Empty);
    }
    if let Some((row, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(FitError::NonFinite { row, value });
    }

    let step = best_step_fit(values, params);

    let mu = mean(values);
    let sigma = std_dev(values);
    if sigma > 0.0 {
        let gauss_distance = ks_distance(values, |x| normal_cdf(x, mu, sigma));
        if gauss_distance <= step.distance {
            return Ok(ScoredFit {
                fit: FitDescriptor::Gaussian { mean: mu, std: sigma },
                distance: gauss_distance,
            });
        }
    }

    Ok(step)
}

fn best_step_fit(values: &[f64], params: &CompilerParams) -> ScoredFit {
    let n = values.len();
    let mut best: Option<(f64, Histogram)> = None;

    for n_buckets in 1..params.max_step_buckets.max(2) {
        let hist = Histogram::equal_width(values, n_buckets);
        let probs = hist.probabilities(n);
        let distance = ks_distance(values, |x| step_cdf(x, &hist.edges, &probs));
        if best.as_ref().is_none_or(|(d, _)| distance < *d) {
            best = Some((distance, hist));
        }
    }

    // The loop runs at least once, so `best` is always set here.
    let (distance, hist) = best.unwrap_or_else(|| (1.0, Histogram::equal_width(values, 1)));
    let probs = hist.probabilities(n);
    ScoredFit {
        fit: FitDescriptor::Step(StepFit::from_probabilities(
            hist.edges,
            &probs,
            params.decimal_precision,
        )),
        distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::data::{gaussian_column, uniform_column};
    use approx::assert_abs_diff_eq;

    #[test]
    fn gaussian_data_gets_gaussian_fit() {
        let values = gaussian_column(2000, 10.0, 25.0, 7);
        let scored = fit_scored(&values, &CompilerParams::default()).unwrap();
        match scored.fit {
            FitDescriptor::Gaussian { mean, std } => {
                assert_abs_diff_eq!(mean, 10.0, epsilon = 3.0);
                assert_abs_diff_eq!(std, 25.0, epsilon = 3.0);
            }
            other => panic!("expected gaussian, got {other:?}"),
        }
        assert!(scored.distance < 0.05);
    }

    #[test]
    fn uniform_data_gets_step_fit() {
        let values = uniform_column(2000, 0.0, 1.0, 11);
        let fit = fit(&values, &CompilerParams::default()).unwrap();
        let FitDescriptor::Step(step) = fit else {
            panic!("expected step fit for uniform data");
        };
        assert!(step.n_buckets() >= 1 && step.n_buckets() < 6);
        assert_eq!(step.probability_units().iter().sum::<u64>(), 1_000_000);
    }

    #[test]
    fn constant_column_becomes_single_bucket() {
        let fit = fit(&[4.0; 20], &CompilerParams::default()).unwrap();
        let FitDescriptor::Step(step) = fit else {
            panic!("expected step fit for constant data");
        };
        assert_eq!(step.edges(), &[3.5, 4.5]);
        assert_eq!(step.probability_units(), &[1_000_000]);
    }

    #[test]
    fn degenerate_inputs_are_errors() {
        let params = CompilerParams::default();
        assert_eq!(fit(&[], &params), Err(FitError::Empty));
        assert!(matches!(
            fit(&[1.0, f64::NAN], &params),
            Err(FitError::NonFinite { row: 1, .. })
        ));
    }

    #[test]
    fn fitting_is_deterministic() {
        let values = gaussian_column(300, 0.0, 1.0, 3);
        let params = CompilerParams::default();
        assert_eq!(fit(&values, &params), fit(&values, &params));
    }
}
