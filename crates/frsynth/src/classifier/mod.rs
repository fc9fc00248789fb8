//! Classifier rule compilation.
//!
//! [`extract`] unrolls a trained [`Classifier`] into a [`RuleNode`]: branches
//! for decision trees, assignment sequences for linear models, scalers and
//! MLP layers, and concatenated stages for pipelines.
//!
//! # Key Types
//!
//! - [`Classifier`]: Closed set of supported kinds, loadable from JSON
//! - [`Extraction`]: Output feature names plus the rule tree
//! - [`ExtractError`]: Unsupported inputs and shape errors
//!
//! # Example
//!
//! ```
//! use frsynth::CompilerParams;
//! use frsynth::classifier::{Classifier, extract};
//!
//! let clf = Classifier::from_json_str(
//!     r#"{"kind": "linear", "coef": [[2.0, -1.0]], "intercept": [0.5]}"#,
//! )
//! .unwrap();
//! let features = vec!["age".to_string(), "debt".to_string()];
//! let out = extract(&clf, &features, "approved", &CompilerParams::default()).unwrap();
//! assert_eq!(out.rules.n_branches(), 0);
//! ```

mod error;
mod extract;
mod kinds;
mod rule;

pub use error::ExtractError;
pub use extract::{Extraction, extract};
pub use kinds::{Activation, Classifier, DecisionTree, Linear, Mlp, Pipeline, Scaler};
pub use rule::{BinaryOp, Comparison, Condition, Expr, RuleNode, Statement, format_literal};
