//! Analysis pipeline for experiment output.
//!
//! Loads experiments, summarizes each one and compares every speed against a
//! baseline speed on experiments that otherwise share their configuration.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono::Utc;
use cgp_core::error::Result;
use cgp_core::evolution::Speed;
use cgp_core::models::Experiment;
use cgp_core::statistics::{find_median, wilcoxon_signed_rank, Wilcoxon};
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregator::{ExperimentAggregator, ExperimentSummary};
use crate::reader::load_experiments;

// ── Public types ──────────────────────────────────────────────────────────────

/// Paired comparison of one experiment against its baseline.
#[derive(Debug, Clone, Serialize)]
pub struct SpeedComparison {
    /// Name of the baseline experiment.
    pub baseline: String,
    /// Name of the compared experiment.
    pub candidate: String,
    pub candidate_speed: Speed,
    /// Runs present in both experiments.
    pub paired_runs: usize,
    pub baseline_median_evals: f64,
    pub candidate_median_evals: f64,
    /// Wilcoxon test of candidate evals minus baseline evals; a negative `z`
    /// means the candidate needed fewer evaluations.
    pub wilcoxon: Wilcoxon,
}

/// The complete output of [`analyze_experiments`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    pub baseline: Speed,
    pub summaries: Vec<ExperimentSummary>,
    pub comparisons: Vec<SpeedComparison>,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Compare every non-baseline experiment with the baseline experiment of its
/// group. Experiments are grouped by [`ExperimentConfig::comparison_key`].
///
/// [`ExperimentConfig::comparison_key`]: cgp_core::config::ExperimentConfig::comparison_key
pub fn compare_speeds(experiments: &[Experiment], baseline: Speed) -> Vec<SpeedComparison> {
    let mut groups: BTreeMap<String, Vec<&Experiment>> = BTreeMap::new();
    for experiment in experiments {
        groups
            .entry(experiment.config.comparison_key())
            .or_default()
            .push(experiment);
    }

    let mut comparisons = Vec::new();
    for members in groups.values() {
        let Some(reference) = members.iter().find(|e| e.config.speed == baseline) else {
            if members.len() > 1 {
                warn!(
                    "No {} experiment among {} comparable experiments",
                    baseline,
                    members.len()
                );
            }
            continue;
        };

        for candidate in members
            .iter()
            .filter(|e| e.config.speed != baseline)
        {
            comparisons.push(compare_pair(reference, candidate));
        }
    }
    comparisons
}

/// Run the full analysis pipeline over result files or directories.
pub fn analyze_experiments(paths: &[PathBuf], baseline: Speed) -> Result<AnalysisReport> {
    let experiments = load_experiments(paths)?;
    info!("Analyzing {} experiments", experiments.len());

    let summaries = ExperimentAggregator::summarize_all(&experiments);
    let comparisons = compare_speeds(&experiments, baseline);

    Ok(AnalysisReport {
        generated_at: Utc::now().to_rfc3339(),
        baseline,
        summaries,
        comparisons,
    })
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn compare_pair(reference: &Experiment, candidate: &Experiment) -> SpeedComparison {
    let reference_evals: HashMap<usize, f64> = reference
        .runs
        .iter()
        .map(|r| (r.run, r.evals as f64))
        .collect();

    let (candidate_evals, baseline_evals): (Vec<f64>, Vec<f64>) = candidate
        .runs
        .iter()
        .filter_map(|r| {
            reference_evals
                .get(&r.run)
                .map(|&base| (r.evals as f64, base))
        })
        .unzip();

    SpeedComparison {
        baseline: reference.name.clone(),
        candidate: candidate.name.clone(),
        candidate_speed: candidate.config.speed,
        paired_runs: candidate_evals.len(),
        baseline_median_evals: find_median(&baseline_evals),
        candidate_median_evals: find_median(&candidate_evals),
        wilcoxon: wilcoxon_signed_rank(&candidate_evals, &baseline_evals),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
