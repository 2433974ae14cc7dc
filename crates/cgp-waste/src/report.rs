//! Plain-text tables printed by the subcommands.

use std::fmt::Write;

use cgp_core::formatting::{format_duration, format_number, percentage};
use cgp_core::prediction::WastePrediction;
use cgp_data::aggregator::ExperimentSummary;
use cgp_data::analysis::SpeedComparison;

/// Key/value summary of a finished `run`.
pub fn run_summary(summary: &ExperimentSummary, base_seed: u64, elapsed_seconds: f64) -> String {
    let rows = [
        ("Experiment", summary.name.clone()),
        (
            "Problem",
            format!(
                "{} (graph {}, rate {}, speed {})",
                summary.problem, summary.graph_length, summary.mutation_rate, summary.speed
            ),
        ),
        (
            "Runs",
            format!(
                "{} ({} successful, {}%)",
                summary.runs,
                summary.successes,
                format_number(percentage(summary.successes as f64, summary.runs as f64, 1), 1)
            ),
        ),
        (
            "Median evals",
            format!(
                "{} (MAD {})",
                format_number(summary.median_evals, 1),
                format_number(summary.mad_evals, 1)
            ),
        ),
        ("90th pct evals", format_number(summary.p90_evals, 1)),
        ("Median skipped", format_number(summary.median_skipped, 1)),
        ("Median estimated", format_number(summary.median_estimated, 1)),
        ("Median active", format_number(summary.median_active_nodes, 1)),
        ("Base seed", base_seed.to_string()),
        ("Elapsed", format_duration(elapsed_seconds)),
    ];

    let mut out = String::new();
    for (label, value) in rows {
        let _ = writeln!(out, "{label:<18}{value}");
    }
    out
}

/// One row per experiment.
pub fn summaries_table(summaries: &[ExperimentSummary]) -> String {
    let headers = [
        "Experiment", "Speed", "Runs", "Success", "Median", "MAD", "P90", "Skipped", "Estimated",
    ];
    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                s.speed.to_string(),
                s.runs.to_string(),
                format!("{}%", format_number(s.success_rate * 100.0, 1)),
                format_number(s.median_evals, 1),
                format_number(s.mad_evals, 1),
                format_number(s.p90_evals, 1),
                format_number(s.median_skipped, 1),
                format_number(s.median_estimated, 1),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

/// One row per candidate compared against its baseline.
pub fn comparisons_table(comparisons: &[SpeedComparison]) -> String {
    let headers = ["Candidate", "Baseline", "Pairs", "Median", "Baseline median", "W", "z"];
    let rows = comparisons
        .iter()
        .map(|c| {
            vec![
                c.candidate.clone(),
                c.baseline.clone(),
                c.paired_runs.to_string(),
                format_number(c.candidate_median_evals, 1),
                format_number(c.baseline_median_evals, 1),
                format_number(c.wilcoxon.w, 1),
                format_number(c.wilcoxon.z, 3),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

/// The predicted-waste grid.
pub fn prediction_table(predictions: &[WastePrediction]) -> String {
    let headers = ["Rate", "Active nodes", "Active genes", "Wasted", "Evals/change"];
    let rows = predictions
        .iter()
        .map(|p| {
            vec![
                p.mutation_rate.to_string(),
                p.active_nodes.to_string(),
                p.active_genes.to_string(),
                format!("{}%", format_number(p.wasted * 100.0, 2)),
                format_number(p.evals_per_change, 2),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

/// Left-align the first column, right-align the rest.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header_cells, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            if i == 0 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
