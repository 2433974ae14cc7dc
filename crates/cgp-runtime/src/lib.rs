//! Runtime layer for cgp-waste.
//!
//! Runs the independent trials of an experiment concurrently and reports
//! their outcomes as they finish.

pub mod orchestrator;
pub mod trial;

pub use cgp_core as core;
pub use orchestrator::{ExperimentHandle, ExperimentOrchestrator, TrialReport};
pub use trial::run_trial;
