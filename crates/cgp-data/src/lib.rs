//! Data layer for the CGP experiments.
//!
//! Writes run records and configurations to disk, discovers and reads them
//! back, aggregates per-experiment statistics and runs the speed comparison
//! analysis.

pub mod aggregator;
pub mod analysis;
pub mod reader;
pub mod writer;

pub use cgp_core as core;
