use rand::prelude::*;

use crate::dataset::Dataset;

/// Draw `n` values from `N(mean, std^2)` (Box-Muller).
pub fn gaussian_column(n: usize, mean: f64, std: f64, seed: u64) -> Vec<f64> {
    assert!(std >= 0.0);
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1: f64 = rng.r#gen::<f64>().max(1e-12);
            let u2: f64 = rng.r#gen::<f64>();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            mean + std * z
        })
        .collect()
}

/// Draw `n` values uniformly from `[min, max)`.
pub fn uniform_column(n: usize, min: f64, max: f64, seed: u64) -> Vec<f64> {
    assert!(max >= min);
    let mut rng = StdRng::seed_from_u64(seed);
    let width = max - min;
    (0..n).map(|_| min + rng.r#gen::<f64>() * width).collect()
}

/// College admissions population.
///
/// - `ethnicity ~ N(0, 10^2)`
/// - `colRank ~ N(25, 10^2)`, plus `shift` wherever `ethnicity > 10`
/// - `yExp ~ N(10, 5^2)`, independent of both
pub fn admissions_dataset(n_rows: usize, shift: f64, seed: u64) -> Dataset {
    let ethnicity = gaussian_column(n_rows, 0.0, 10.0, seed);
    let col_rank: Vec<f64> = gaussian_column(n_rows, 25.0, 10.0, seed.wrapping_add(1))
        .into_iter()
        .zip(&ethnicity)
        .map(|(rank, &eth)| if eth > 10.0 { rank + shift } else { rank })
        .collect();
    let y_exp = gaussian_column(n_rows, 10.0, 5.0, seed.wrapping_add(2));

    Dataset::from_columns(vec![
        ("ethnicity", ethnicity),
        ("colRank", col_rank),
        ("yExp", y_exp),
    ])
    .expect("generated columns have equal length")
}

/// Two-level dependency chain.
///
/// - `group`: two well separated modes at `-5` and `+5`
/// - `score`: `+100` in the upper group, plus independent noise `e ~ N(0, 1)`
/// - `outcome`: `+50` wherever `e > 0`
///
/// `outcome` is independent of `group` but depends on `score` inside either
/// group, so a depth-2 model conditions it below `score`.
pub fn layered_dataset(n_rows: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let group: Vec<f64> = gaussian_column(n_rows, 0.0, 1.0, seed.wrapping_add(1))
        .into_iter()
        .map(|z| if rng.r#gen::<bool>() { z + 5.0 } else { z - 5.0 })
        .collect();
    let noise = gaussian_column(n_rows, 0.0, 1.0, seed.wrapping_add(2));
    let score: Vec<f64> = group
        .iter()
        .zip(&noise)
        .map(|(&g, &e)| if g > 0.0 { e + 100.0 } else { e })
        .collect();
    let outcome: Vec<f64> = gaussian_column(n_rows, 0.0, 1.0, seed.wrapping_add(3))
        .into_iter()
        .zip(&noise)
        .map(|(z, &e)| if e > 0.0 { z + 50.0 } else { z })
        .collect();

    Dataset::from_columns(vec![("group", group), ("score", score), ("outcome", outcome)])
        .expect("generated columns have equal length")
}

/// `n_columns` mutually independent standard normal columns `c0, c1, ...`.
pub fn independent_dataset(n_rows: usize, n_columns: usize, seed: u64) -> Dataset {
    Dataset::from_columns((0..n_columns).map(|c| {
        (
            format!("c{c}"),
            gaussian_column(n_rows, 0.0, 1.0, seed.wrapping_add(c as u64)),
        )
    }))
    .expect("generated columns have equal length")
}
