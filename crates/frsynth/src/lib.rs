//! frsynth: compiles a dataset and a trained classifier into a FairSquare
//! probabilistic program.
//!
//! The program has two parts. `popModel()` is a generative model of the
//! dataset: one fitted distribution per column, nested under conditionals on
//! the columns it depends on. `F()` is the classifier unrolled into
//! arithmetic and branches over the same variable names.
//!
//! # Key Types
//!
//! - [`Dataset`] - Named numeric columns
//! - [`CompilerParams`] - All tuning thresholds
//! - [`PopulationModel`] - Output of [`compile`]
//! - [`Classifier`] / [`Extraction`] - Input and output of [`extract`]
//! - [`ProgramWriter`] - Text emission
//!
//! # Compiling a Program
//!
//! [`compile_program`] runs every stage and returns the text;
//! [`compile_to_path`] writes it to a file.
//!
//! ```
//! use frsynth::{Classifier, CompileRequest, Dataset, Predicate, compile_program};
//!
//! let ds = Dataset::from_columns(vec![
//!     ("age", vec![22.0, 35.0, 41.0, 29.0, 55.0, 38.0]),
//!     ("hire", vec![0.0, 1.0, 1.0, 0.0, 1.0, 1.0]),
//! ])
//! .unwrap();
//! let clf = Classifier::from_json_str(r#"{"kind": "linear", "coef": [0.1], "intercept": -3.0}"#).unwrap();
//! let request = CompileRequest::new("hire")
//!     .with_sensitive(Predicate::parse("age > 30").unwrap())
//!     .with_fairness(Predicate::parse("hire > 0").unwrap());
//!
//! let program = compile_program(&ds, &clf, &request).unwrap();
//! assert!(program.starts_with("def popModel():\n\tage = "));
//! assert!(program.contains("\n\ndef F():\n\thire = age * 0.1000\n"));
//! ```

pub use approx;

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod emit;
pub mod error;
pub mod fit;
pub mod model;
pub mod partition;
pub mod program;
pub mod stats;
pub mod testing;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use classifier::{Classifier, ExtractError, Extraction, RuleNode, extract};
pub use config::{CompilerParams, ParamValidationError};
pub use dataset::{Dataset, DatasetError};
pub use emit::{Predicate, PredicateError, ProgramWriter};
pub use error::{Error, Result};
pub use fit::{FitDescriptor, FitError, fit};
pub use model::{ModelError, PopulationModel, compile};
pub use program::{CompileRequest, compile_program, compile_to_path};
