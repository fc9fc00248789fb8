//! Program text emission.
//!
//! The emitted program has two blocks, indented with one tab per level:
//!
//! ```text
//! def popModel():
//!     ethnicity = gaussian(0.000000, 10.000000)
//!     if ethnicity <= 10.000000:
//!         colRank = gaussian(25.000000, 10.000000)
//!     else:
//!         colRank = gaussian(30.000000, 10.000000)
//!     sensitiveAttribute(ethnicity > 10.000000)
//!
//! def F():
//!     if colRank > 20.0000:
//!         hire = 1
//!     else:
//!         hire = 0
//!     fairnessTarget(hire > 0.5000)
//! ```
//!
//! Population literals, including the thresholds of `sensitiveAttribute` and
//! `qualified`, use `decimal_precision` decimals. Classifier literals and
//! `fairnessTarget` thresholds use `literal_precision`. Step probabilities are printed from
//! their integer units, so the printed values of a step fit sum to exactly one.

mod predicate;
mod writer;

pub use predicate::{Predicate, PredicateError};
pub use writer::{ProgramWriter, render_fit};
