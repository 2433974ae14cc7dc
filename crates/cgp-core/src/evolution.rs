//! The (1 + λ) evolution strategy and its wasted-evaluation handling modes.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::individual::{Individual, Layout};
use crate::problems::FitnessFunction;

// ── Speed ─────────────────────────────────────────────────────────────────────

/// How offspring that repeat their parent's phenotype are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    /// Evaluate every offspring.
    #[default]
    Normal,
    /// Do not evaluate offspring whose active genes match the parent.
    Skip,
    /// Keep mutating such offspring until an active gene changes.
    Accumulate,
    /// Mutate exactly one active gene per offspring.
    Single,
}

impl Speed {
    pub const ALL: [Speed; 4] = [Speed::Normal, Speed::Skip, Speed::Accumulate, Speed::Single];

    /// `true` for the modes that compare every offspring with its parent.
    fn checks_phenotype(self) -> bool {
        matches!(self, Speed::Skip | Speed::Accumulate)
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Speed::Normal => "normal",
            Speed::Skip => "skip",
            Speed::Accumulate => "accumulate",
            Speed::Single => "single",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Speed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Speed::ALL
            .into_iter()
            .find(|speed| speed.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown speed '{s}'"))
    }
}

// ── Parameters & outcome ──────────────────────────────────────────────────────

/// Search parameters for a single evolutionary run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolutionParams {
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    /// Offspring created per generation (λ).
    pub off_size: usize,
    pub speed: Speed,
    /// Evaluation budget.
    pub max_evals: u64,
    /// Fitness at which the run counts as solved.
    pub max_fitness: f64,
}

/// What a finished run reports.
#[derive(Debug, Clone)]
pub struct EvolutionOutcome {
    /// Fitness evaluations spent, including the initial parent.
    pub evals: u64,
    /// Completed or interrupted generations.
    pub generations: u64,
    /// Best fitness seen.
    pub best_fitness: f64,
    /// Whether `max_fitness` was reached within the budget.
    pub success: bool,
    /// Offspring found phenotypically identical to their parent.
    pub skipped: u64,
    /// Expected number of such offspring, summed over all offspring.
    pub estimated: f64,
    /// Active nodes of `best`.
    pub active_nodes: usize,
    /// First individual that reached `best_fitness`.
    pub best: Individual,
    /// Parent when the run stopped.
    pub parent: Individual,
}

// ── Evolution ─────────────────────────────────────────────────────────────────

/// A (1 + λ) evolutionary search over CGP genomes.
pub struct Evolution<'a, F: FitnessFunction> {
    layout: Layout,
    params: EvolutionParams,
    fitness: &'a F,
}

impl<'a, F: FitnessFunction> Evolution<'a, F> {
    pub fn new(layout: Layout, params: EvolutionParams, fitness: &'a F) -> Self {
        Self {
            layout,
            params,
            fitness,
        }
    }

    /// Run until the evaluation budget is spent or `max_fitness` is reached.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> EvolutionOutcome {
        let parent = Individual::random(self.layout, rng);
        self.run_from(parent, rng)
    }

    /// Like [`Evolution::run`], starting from `parent` instead of a random
    /// genome. `parent` must share this search's layout.
    pub fn run_from<R: Rng + ?Sized>(
        &self,
        mut parent: Individual,
        rng: &mut R,
    ) -> EvolutionOutcome {
        let params = &self.params;
        let mut evals = 0u64;
        let mut generations = 0u64;
        let mut skipped = 0u64;
        let mut estimated = 0.0f64;

        parent.fitness = self.fitness.fitness(&parent);
        evals += 1;
        let mut best = parent.clone();

        'search: while !self.finished(evals, best.fitness) {
            generations += 1;

            let mut offspring: Vec<Individual> = (0..params.off_size)
                .map(|_| self.offspring(&parent, rng))
                .collect();

            // Probability a mutant leaves every active gene of the parent alone.
            let active_genes =
                self.layout.output_length + parent.active().len() * self.layout.node_step();
            let unchanged = (1.0 - params.mutation_rate).powf(active_genes as f64);

            for slot in offspring.iter_mut() {
                estimated += unchanged;
                let mut mutant = slot.clone();
                let mut equivalent: Option<Individual> = None;

                if params.speed.checks_phenotype() {
                    let mut change = parent.asym_phenotypic_difference(&mutant);
                    if change == 0 {
                        skipped += 1;
                        if params.speed == Speed::Skip {
                            continue;
                        }
                        while change == 0 {
                            let next = mutant.mutate(params.mutation_rate, rng);
                            equivalent = Some(std::mem::replace(&mut mutant, next));
                            change = parent.asym_phenotypic_difference(&mutant);
                        }
                    }
                }

                mutant.fitness = self.fitness.fitness(&mutant);
                evals += 1;
                if mutant.cmp_fitness(&best).is_gt() {
                    best = mutant.clone();
                }

                *slot = match equivalent {
                    // A strictly worse mutant gives way to its last neutral ancestor.
                    Some(prev) if mutant.cmp_fitness(&parent).is_lt() => prev,
                    _ => mutant,
                };

                if self.finished(evals, best.fitness) {
                    break 'search;
                }
            }

            if let Some(child) = first_fittest(&offspring) {
                if child.cmp_fitness(&parent).is_ge() {
                    if child.cmp_fitness(&parent).is_gt() {
                        debug!(
                            generation = generations,
                            evals,
                            fitness = child.fitness,
                            active = child.active().len(),
                            "parent improved"
                        );
                    }
                    parent = child.clone();
                }
            }
        }

        EvolutionOutcome {
            evals,
            generations,
            best_fitness: best.fitness,
            success: best.fitness >= params.max_fitness,
            skipped,
            estimated,
            active_nodes: best.active().len(),
            best,
            parent,
        }
    }

    fn offspring<R: Rng + ?Sized>(&self, parent: &Individual, rng: &mut R) -> Individual {
        match self.params.speed {
            Speed::Single => parent.one_active_mutation(rng),
            _ => parent.mutate(self.params.mutation_rate, rng),
        }
    }

    fn finished(&self, evals: u64, best_fitness: f64) -> bool {
        evals >= self.params.max_evals || best_fitness >= self.params.max_fitness
    }
}

/// The first individual with the highest fitness.
fn first_fittest(individuals: &[Individual]) -> Option<&Individual> {
    individuals.iter().fold(None, |best: Option<&Individual>, candidate| match best {
        Some(current) if candidate.cmp_fitness(current).is_le() => Some(current),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::BINARY_OPERATORS;
    use crate::problems::{Problem, ProblemKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;

    fn params(speed: Speed) -> EvolutionParams {
        EvolutionParams {
            mutation_rate: 0.05,
            off_size: 4,
            speed,
            max_evals: 500_000,
            max_fitness: 1.0,
        }
    }

    fn parity_setup() -> (Layout, Problem) {
        let problem = Problem::new(ProblemKind::EvenParity, 3).unwrap();
        let layout = Layout::new(50, 3, 1, &BINARY_OPERATORS).unwrap();
        (layout, problem)
    }

    /// Counts calls and always returns the same fitness.
    struct Flat {
        calls: Cell<u64>,
    }

    impl FitnessFunction for Flat {
        fn fitness(&self, _individual: &Individual) -> f64 {
            self.calls.set(self.calls.get() + 1);
            0.5
        }
    }

    #[test]
    fn test_speed_parse_and_display() {
        for speed in Speed::ALL {
            assert_eq!(speed.to_string().parse::<Speed>().unwrap(), speed);
        }
        assert_eq!("SKIP".parse::<Speed>().unwrap(), Speed::Skip);
        assert!("fast".parse::<Speed>().is_err());
        assert_eq!(Speed::default(), Speed::Normal);
    }

    #[test]
    fn test_every_speed_solves_three_bit_parity() {
        let (layout, problem) = parity_setup();
        for speed in Speed::ALL {
            let mut rng = StdRng::seed_from_u64(42);
            let outcome = Evolution::new(layout, params(speed), &problem).run(&mut rng);
            assert!(outcome.success, "{speed} did not solve parity");
            assert_eq!(outcome.best_fitness, 1.0);
            assert_eq!(problem.fitness(&outcome.best), 1.0);
            assert!(outcome.evals <= 500_000);
        }
    }

    #[test]
    fn test_budget_is_respected_exactly() {
        let (layout, _) = parity_setup();
        let flat = Flat { calls: Cell::new(0) };
        let mut p = params(Speed::Normal);
        p.max_evals = 37;
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = Evolution::new(layout, p, &flat).run(&mut rng);
        assert_eq!(outcome.evals, 37);
        assert_eq!(flat.calls.get(), 37);
        assert!(!outcome.success);
        // One initial evaluation, then four per generation.
        assert_eq!(outcome.generations, 9);
    }

    #[test]
    fn test_normal_never_counts_skips() {
        let (layout, _) = parity_setup();
        let flat = Flat { calls: Cell::new(0) };
        let mut p = params(Speed::Normal);
        p.max_evals = 500;
        let mut rng = StdRng::seed_from_u64(2);
        let outcome = Evolution::new(layout, p, &flat).run(&mut rng);
        assert_eq!(outcome.skipped, 0);
        assert!(outcome.estimated > 0.0);
    }

    #[test]
    fn test_skip_saves_evaluations() {
        let (layout, _) = parity_setup();
        let flat = Flat { calls: Cell::new(0) };
        let mut p = params(Speed::Skip);
        p.max_evals = 500;
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = Evolution::new(layout, p, &flat).run(&mut rng);
        assert_eq!(outcome.evals, 500);
        assert!(outcome.skipped > 0, "low mutation rate should produce skips");
        // Skipped offspring cost nothing, so more generations fit the budget.
        assert!(outcome.generations * 4 > outcome.evals - 1);
    }

    #[test]
    fn test_accumulate_evaluates_every_offspring() {
        let (layout, _) = parity_setup();
        let flat = Flat { calls: Cell::new(0) };
        let mut p = params(Speed::Accumulate);
        p.max_evals = 401;
        let mut rng = StdRng::seed_from_u64(4);
        let outcome = Evolution::new(layout, p, &flat).run(&mut rng);
        // Each of the 100 generations spends exactly four evaluations.
        assert_eq!(outcome.evals, 401);
        assert_eq!(outcome.generations, 100);
        assert!(outcome.skipped > 0);
    }

    #[test]
    fn test_estimated_matches_formula_for_first_generation() {
        let (layout, _) = parity_setup();
        let flat = Flat { calls: Cell::new(0) };
        let mut p = params(Speed::Normal);
        p.max_evals = 5;
        let mut rng = StdRng::seed_from_u64(9);
        let outcome = Evolution::new(layout, p, &flat).run(&mut rng);

        // Same seed reproduces the initial parent.
        let mut rng = StdRng::seed_from_u64(9);
        let parent = Individual::random(layout, &mut rng);
        let active_genes = 1 + parent.active().len() * 3;
        let expected = 4.0 * 0.95f64.powi(active_genes as i32);
        assert!((outcome.estimated - expected).abs() < 1e-12);
    }

    #[test]
    fn test_runs_are_deterministic_for_a_seed() {
        let (layout, problem) = parity_setup();
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            Evolution::new(layout, params(Speed::Skip), &problem).run(&mut rng)
        };
        let a = run(17);
        let b = run(17);
        assert_eq!(a.evals, b.evals);
        assert_eq!(a.skipped, b.skipped);
        assert_eq!(a.best.genes(), b.best.genes());
    }

    #[test]
    fn test_first_fittest_prefers_earliest() {
        let layout = Layout::new(2, 1, 1, &BINARY_OPERATORS).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut a = Individual::random(layout, &mut rng);
        let mut b = Individual::random(layout, &mut rng);
        let mut c = Individual::random(layout, &mut rng);
        a.fitness = 0.2;
        b.fitness = 0.8;
        c.fitness = 0.8;
        let list = vec![a, b.clone(), c];
        let best = first_fittest(&list).unwrap();
        assert_eq!(best.genes(), b.genes());
        assert!(first_fittest(&[]).is_none());
    }

    /// Scores 0.5 for the phenotype of `original` and 0.0 for anything else.
    struct SamePhenotype {
        original: Individual,
    }

    impl FitnessFunction for SamePhenotype {
        fn fitness(&self, individual: &Individual) -> f64 {
            if self.original.asym_phenotypic_difference(individual) == 0 {
                0.5
            } else {
                0.0
            }
        }
    }

    /// Output reads input 0 directly, so every node gene is inactive.
    fn wired_to_input() -> Individual {
        let layout = Layout::new(50, 3, 1, &BINARY_OPERATORS).unwrap();
        Individual::from_genes(layout, vec![0; layout.genome_length()])
    }

    fn drift(speed: Speed) -> (Individual, EvolutionOutcome) {
        let original = wired_to_input();
        assert!(original.active().is_empty());
        let fitness = SamePhenotype {
            original: original.clone(),
        };
        let params = EvolutionParams {
            mutation_rate: 0.05,
            off_size: 1,
            speed,
            max_evals: 500,
            max_fitness: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(11);
        let evolution = Evolution::new(*original.layout(), params, &fitness);
        let outcome = evolution.run_from(original.clone(), &mut rng);
        (original, outcome)
    }

    fn distance(a: &Individual, b: &Individual) -> usize {
        crate::statistics::diff_count(a.genes(), b.genes())
    }

    #[test]
    fn test_normal_accepts_equally_fit_offspring() {
        let (original, outcome) = drift(Speed::Normal);
        assert_eq!(outcome.parent.fitness, 0.5);
        assert_eq!(original.asym_phenotypic_difference(&outcome.parent), 0);
        assert!(distance(&original, &outcome.parent) > 40);
    }

    #[test]
    fn test_skip_promotes_skipped_offspring() {
        let (original, outcome) = drift(Speed::Skip);
        assert!(outcome.skipped > 0);
        // Never evaluated, yet carries the fitness it inherited.
        assert_eq!(outcome.parent.fitness, 0.5);
        assert_eq!(original.asym_phenotypic_difference(&outcome.parent), 0);
        assert!(distance(&original, &outcome.parent) > 40);
    }

    #[test]
    fn test_accumulate_falls_back_to_equivalent_mutant() {
        let (original, outcome) = drift(Speed::Accumulate);
        // Every evaluated mutant has a new phenotype and scores 0.0, so the
        // parent can only move through the last equivalent mutant.
        assert_eq!(outcome.parent.fitness, 0.5);
        assert_eq!(original.asym_phenotypic_difference(&outcome.parent), 0);
        assert!(distance(&original, &outcome.parent) > 40);
    }

    #[test]
    fn test_single_never_drifts_when_every_change_hurts() {
        let (original, outcome) = drift(Speed::Single);
        assert_eq!(outcome.parent.genes(), original.genes());
        assert_eq!(outcome.parent.fitness, 0.5);
    }
}
