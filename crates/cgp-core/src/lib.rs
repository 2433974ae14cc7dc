//! Core building blocks for the CGP wasted-evaluation experiments.
//!
//! Holds the error type, configuration and CLI settings, the Cartesian
//! Genetic Programming genome, the benchmark problems, the (1 + λ) evolution
//! strategy with its wasted-evaluation handling modes, and the statistics
//! used to compare those modes.

pub mod config;
pub mod error;
pub mod evolution;
pub mod formatting;
pub mod functions;
pub mod individual;
pub mod models;
pub mod prediction;
pub mod problems;
pub mod settings;
pub mod statistics;
