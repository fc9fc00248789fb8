//! Population model compilation.
//!
//! [`compile`] turns a [`Dataset`](crate::Dataset) into a [`PopulationModel`]:
//! a forest of [`ModelNode`]s, each holding one column's fit and the
//! partitions of that column under which later columns are modeled
//! differently.
//!
//! # Branch symmetry
//!
//! Sibling branches of one partition always model the same set of columns.
//! When recursion conditions a column in some branches only, that column is
//! pruned from all of them so the emitted program never claims a dependency
//! that holds on one side of a split only.

mod compiler;
mod completed;
mod node;

pub use compiler::{ModelError, PopulationModel, compile};
pub use completed::CompletedSet;
pub use node::{Branch, ModelNode, Partition};
