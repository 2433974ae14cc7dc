//! Per-experiment summary statistics.

use cgp_core::evolution::Speed;
use cgp_core::models::Experiment;
use cgp_core::problems::ProblemKind;
use cgp_core::statistics::{find_median, median_deviation, percentile};
use serde::Serialize;

// ── ExperimentSummary ─────────────────────────────────────────────────────────

/// Medians and success figures for one experiment.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub name: String,
    pub problem: ProblemKind,
    pub speed: Speed,
    pub mutation_rate: f64,
    pub graph_length: usize,
    pub runs: usize,
    pub successes: usize,
    /// Fraction of runs that reached the target fitness.
    pub success_rate: f64,
    pub median_evals: f64,
    /// Median absolute deviation of evaluations.
    pub mad_evals: f64,
    pub p90_evals: f64,
    pub median_skipped: f64,
    pub median_estimated: f64,
    pub median_active_nodes: f64,
}

/// Stateless helper that turns experiments into summaries.
pub struct ExperimentAggregator;

impl ExperimentAggregator {
    /// Summarize a single experiment. An experiment without runs yields zeros.
    pub fn summarize(experiment: &Experiment) -> ExperimentSummary {
        let evals = experiment.evals();
        let (median_evals, mad_evals) = median_deviation(&evals, None);

        let mut sorted_evals = evals.clone();
        sorted_evals.sort_by(|a, b| a.total_cmp(b));

        let column = |f: fn(&cgp_core::models::RunRecord) -> f64| -> f64 {
            let values: Vec<f64> = experiment.runs.iter().map(f).collect();
            find_median(&values)
        };

        let runs = experiment.runs.len();
        let successes = experiment.successes();

        ExperimentSummary {
            name: experiment.name.clone(),
            problem: experiment.config.problem,
            speed: experiment.config.speed,
            mutation_rate: experiment.config.mutation_rate,
            graph_length: experiment.config.graph_length,
            runs,
            successes,
            success_rate: if runs == 0 {
                0.0
            } else {
                successes as f64 / runs as f64
            },
            median_evals,
            mad_evals,
            p90_evals: percentile(&sorted_evals, 90.0),
            median_skipped: column(|r| r.skipped as f64),
            median_estimated: column(|r| r.estimated),
            median_active_nodes: column(|r| r.active_nodes as f64),
        }
    }

    /// Summarize every experiment, keeping their order.
    pub fn summarize_all(experiments: &[Experiment]) -> Vec<ExperimentSummary> {
        experiments.iter().map(Self::summarize).collect()
    }
}
