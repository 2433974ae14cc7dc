use serde::{Deserialize, Serialize};

use crate::config::ExperimentConfig;

/// The outcome of one independent evolutionary run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Zero-based run index within the experiment.
    pub run: usize,
    /// Seed the run's random generator was created with.
    pub seed: u64,
    /// Fitness evaluations spent.
    pub evals: u64,
    /// Generations started.
    #[serde(default)]
    pub generations: u64,
    /// Whether the target fitness was reached.
    pub success: bool,
    /// Best fitness found.
    pub best_fitness: f64,
    /// Offspring detected as phenotypically identical to their parent.
    #[serde(default)]
    pub skipped: u64,
    /// Predicted number of such offspring.
    #[serde(default)]
    pub estimated: f64,
    /// Active nodes in the best individual.
    #[serde(default)]
    pub active_nodes: usize,
    /// Wall-clock duration of the run.
    #[serde(default)]
    pub elapsed_seconds: f64,
}

/// A configuration together with the runs performed under it.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    /// Display name, usually the result file stem.
    pub name: String,
    pub config: ExperimentConfig,
    pub runs: Vec<RunRecord>,
}

impl Experiment {
    /// Evaluation counts of all runs, in run order.
    pub fn evals(&self) -> Vec<f64> {
        self.runs.iter().map(|r| r.evals as f64).collect()
    }

    /// Number of successful runs.
    pub fn successes(&self) -> usize {
        self.runs.iter().filter(|r| r.success).count()
    }
}
