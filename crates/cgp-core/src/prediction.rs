//! Predicted amounts of wasted evaluations.
//!
//! A mutant is wasted when none of its parent's active genes change. With a
//! per-gene mutation rate `r` and `g` active genes that happens with
//! probability `(1 - r)^g`.

use serde::{Deserialize, Serialize};

/// Number of active genes for `active_nodes` nodes of arity `max_arity`
/// feeding `output_length` outputs.
pub fn active_genes(active_nodes: usize, max_arity: usize, output_length: usize) -> usize {
    active_nodes * (max_arity + 1) + output_length
}

/// Probability that a mutation with `rate` leaves `active_genes` genes untouched.
pub fn probability_unchanged(rate: f64, active_genes: usize) -> f64 {
    (1.0 - rate).powf(active_genes as f64)
}

/// Expected offspring evaluated per offspring that changes the phenotype.
///
/// Infinite when every offspring is wasted.
pub fn expected_evaluations_per_change(probability_wasted: f64) -> f64 {
    if probability_wasted >= 1.0 {
        f64::INFINITY
    } else {
        1.0 / (1.0 - probability_wasted)
    }
}

/// One point of the predicted-waste table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WastePrediction {
    pub mutation_rate: f64,
    pub active_nodes: usize,
    pub active_genes: usize,
    /// Fraction of offspring expected to be wasted.
    pub wasted: f64,
    /// Expected evaluations per offspring with a new phenotype.
    pub evals_per_change: f64,
}

/// Build the predicted-waste table for every combination of `rates` and
/// `active_node_counts`, rates varying slowest.
pub fn predict_waste(
    rates: &[f64],
    active_node_counts: &[usize],
    max_arity: usize,
    output_length: usize,
) -> Vec<WastePrediction> {
    rates
        .iter()
        .flat_map(|&rate| {
            active_node_counts.iter().map(move |&active_nodes| {
                let genes = active_genes(active_nodes, max_arity, output_length);
                let wasted = probability_unchanged(rate, genes);
                WastePrediction {
                    mutation_rate: rate,
                    active_nodes,
                    active_genes: genes,
                    wasted,
                    evals_per_change: expected_evaluations_per_change(wasted),
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_genes() {
        assert_eq!(active_genes(10, 2, 1), 31);
        assert_eq!(active_genes(0, 2, 3), 3);
    }

    #[test]
    fn test_probability_unchanged() {
        assert_eq!(probability_unchanged(0.0, 50), 1.0);
        assert_eq!(probability_unchanged(1.0, 5), 0.0);
        assert!((probability_unchanged(0.5, 2) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_probability_unchanged_huge_gene_counts() {
        let genes = active_genes(3_000_000_000, 2, 1);
        let p = probability_unchanged(0.01, genes);
        assert_eq!(p, 0.0);
        assert_eq!(expected_evaluations_per_change(p), 1.0);
    }

    #[test]
    fn test_expected_evaluations_per_change() {
        assert_eq!(expected_evaluations_per_change(0.0), 1.0);
        assert_eq!(expected_evaluations_per_change(0.75), 4.0);
        assert!(expected_evaluations_per_change(1.0).is_infinite());
    }

    #[test]
    fn test_predict_waste_grid_order() {
        let table = predict_waste(&[0.01, 0.1], &[1, 10, 100], 2, 1);
        assert_eq!(table.len(), 6);
        assert_eq!(table[0].mutation_rate, 0.01);
        assert_eq!(table[0].active_nodes, 1);
        assert_eq!(table[2].active_nodes, 100);
        assert_eq!(table[3].mutation_rate, 0.1);
        // More active genes means less waste at the same rate.
        assert!(table[0].wasted > table[1].wasted);
        assert!(table[1].wasted > table[2].wasted);
        assert_eq!(table[1].active_genes, 31);
    }
}
