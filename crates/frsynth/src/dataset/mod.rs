//! Named, column-oriented datasets.
//!
//! This module provides [`Dataset`], the read-only input of the population
//! model compiler. Columns are identified by unique names and kept in their
//! declared order, which is the order the compiler visits them in.
//!
//! # Key Types
//!
//! - [`Dataset`]: Feature-major container `[n_columns, n_rows]`
//! - [`DatasetError`]: Construction and loading errors
//!
//! # Storage Layout
//!
//! Values are stored in **feature-major** layout: each column's values across
//! all rows are contiguous. Row subsets are expressed as index slices and
//! gathered on demand, so recursion into a partition never copies the dataset.
//!
//! # Example
//!
//! ```
//! use frsynth::dataset::Dataset;
//!
//! let ds = Dataset::from_columns(vec![
//!     ("age", vec![25.0, 40.0, 31.0]),
//!     ("income", vec![1.0, 0.0, 1.0]),
//! ])
//! .unwrap();
//!
//! assert_eq!(ds.n_rows(), 3);
//! assert_eq!(ds.n_columns(), 2);
//! assert_eq!(ds.index_of("income"), Some(1));
//! ```

mod dataset;
mod error;
mod io;

pub use dataset::Dataset;
pub use error::DatasetError;
