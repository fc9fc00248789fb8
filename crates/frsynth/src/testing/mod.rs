//! Test utilities: seeded synthetic columns and scenario datasets.
//!
//! Everything here is deterministic for a given seed, so tests and doc
//! examples can assert on structure without depending on global state.

pub mod data;
