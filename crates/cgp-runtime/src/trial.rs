//! A single seeded evolutionary run.

use std::time::Instant;

use cgp_core::config::ExperimentConfig;
use cgp_core::error::Result;
use cgp_core::evolution::{Evolution, EvolutionParams};
use cgp_core::individual::Layout;
use cgp_core::models::RunRecord;
use cgp_core::problems::{FitnessFunction, Problem};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// Build the problem for `config` and perform run `run` with `seed`.
pub fn run_trial(config: &ExperimentConfig, run: usize, seed: u64) -> Result<RunRecord> {
    let problem = Problem::new(config.problem, config.input_length)?;
    let layout = config.layout()?;
    Ok(run_trial_with(&problem, layout, config.params(), run, seed))
}

/// Perform one run against an already built fitness function.
pub fn run_trial_with<F: FitnessFunction>(
    fitness: &F,
    layout: Layout,
    params: EvolutionParams,
    run: usize,
    seed: u64,
) -> RunRecord {
    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(seed);
    let outcome = Evolution::new(layout, params, fitness).run(&mut rng);
    let elapsed = start.elapsed().as_secs_f64();

    debug!(
        run,
        seed,
        evals = outcome.evals,
        success = outcome.success,
        skipped = outcome.skipped,
        "trial finished"
    );
    if outcome.success {
        debug!("run {} solution:\n{}", run, outcome.best.describe_active());
    }

    RunRecord {
        run,
        seed,
        evals: outcome.evals,
        generations: outcome.generations,
        success: outcome.success,
        best_fitness: outcome.best_fitness,
        skipped: outcome.skipped,
        estimated: outcome.estimated,
        active_nodes: outcome.active_nodes,
        elapsed_seconds: elapsed,
    }
}
