//! Partition search.
//!
//! Looks for thresholds on a *conditioning* column that make a *subject*
//! column easier to describe, measured by the drop in the subject's histogram
//! entropy. Splits must leave enough rows on each side
//! (`partition_frac_thresh`) and gain at least `information_gain_thresh`.
//!
//! - [`partition`]: best single threshold
//! - [`refine`]: stepwise refinement into up to `max_cuts` cuts, always
//!   splitting the highest-entropy bucket next
//!
//! Both functions work on plain slices and report rows as positions into them.

mod range;
mod search;

pub use range::PartitionRange;
pub use search::{
    RefinedBucket, Refinement, Side, Split, column_entropy, information_gain, partition, refine,
};
