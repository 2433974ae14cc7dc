//! Async experiment orchestrator.
//!
//! Runs the independent trials of one experiment on tokio's blocking pool and
//! streams a [`TrialReport`] per finished trial through an `mpsc` channel, so
//! the caller can log progress while the remaining trials are still running.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cgp_core::config::ExperimentConfig;
use cgp_core::error::Result;
use cgp_core::models::RunRecord;
use cgp_core::problems::Problem;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::trial::run_trial_with;

// ── Public types ──────────────────────────────────────────────────────────────

/// Progress message sent once per finished trial.
#[derive(Debug, Clone)]
pub struct TrialReport {
    pub record: RunRecord,
    /// Trials finished so far, this one included.
    pub completed: usize,
    /// Trials in the experiment.
    pub total: usize,
}

// ── ExperimentOrchestrator ────────────────────────────────────────────────────

/// Runs every trial of an experiment.
///
/// Call [`ExperimentOrchestrator::start`] to launch the trials in a dedicated
/// tokio task, or [`ExperimentOrchestrator::run_to_completion`] to wait for
/// all of them.
pub struct ExperimentOrchestrator {
    config: ExperimentConfig,
    problem: Problem,
    base_seed: u64,
    workers: usize,
}

impl ExperimentOrchestrator {
    /// Validate `config` and resolve its seed and worker count.
    ///
    /// Without a configured seed the base seed is drawn from entropy.
    /// Without a configured worker count every available core is used.
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        let problem = Problem::new(config.problem, config.input_length)?;
        let base_seed = config.seed.unwrap_or_else(rand::random);
        let workers = config.workers.unwrap_or_else(default_workers).max(1);
        Ok(Self {
            config,
            problem,
            base_seed,
            workers,
        })
    }

    /// Seed of run 0; run `i` uses `base_seed + i`.
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The configuration with the resolved base seed filled in.
    pub fn resolved_config(&self) -> ExperimentConfig {
        let mut config = self.config.clone();
        config.seed = Some(self.base_seed);
        config
    }

    /// Start running the trials.
    ///
    /// Returns the receiving end for [`TrialReport`]s, closed once every trial
    /// has finished, and an [`ExperimentHandle`] that can abort the experiment.
    pub fn start(self) -> (mpsc::Receiver<TrialReport>, ExperimentHandle) {
        let (tx, rx) = mpsc::channel(self.workers * 2);

        let handle = tokio::spawn(async move {
            self.experiment_loop(tx).await;
        });

        (rx, ExperimentHandle { handle })
    }

    /// Run every trial and return the records sorted by run index.
    pub async fn run_to_completion(self) -> Vec<RunRecord> {
        let total = self.config.runs;
        let (mut rx, _handle) = self.start();

        let mut records = Vec::with_capacity(total);
        while let Some(report) = rx.recv().await {
            records.push(report.record);
        }
        records.sort_by_key(|r| r.run);
        records
    }

    // ── Private implementation ────────────────────────────────────────────

    async fn experiment_loop(self, tx: mpsc::Sender<TrialReport>) {
        let total = self.config.runs;
        let layout = match self.config.layout() {
            Ok(layout) => layout,
            Err(e) => {
                tracing::error!(error = %e, "invalid genome layout; no trials started");
                return;
            }
        };
        let params = self.config.params();
        let problem = Arc::new(self.problem);
        let completed = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        tracing::debug!(
            runs = total,
            workers = self.workers,
            base_seed = self.base_seed,
            "starting experiment"
        );

        for run in 0..total {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            if tx.is_closed() {
                tracing::debug!("report channel closed; no further trials started");
                break;
            }

            let seed = self.base_seed.wrapping_add(run as u64);
            let problem = Arc::clone(&problem);
            let completed = Arc::clone(&completed);
            let tx = tx.clone();

            tasks.spawn_blocking(move || {
                let record = run_trial_with(problem.as_ref(), layout, params, run, seed);
                drop(permit);
                let report = TrialReport {
                    record,
                    completed: completed.fetch_add(1, Ordering::SeqCst) + 1,
                    total,
                };
                if tx.blocking_send(report).is_err() {
                    tracing::debug!(run, "receiver dropped; trial report discarded");
                }
            });
        }
        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "trial task failed");
            }
        }
    }
}

// ── ExperimentHandle ──────────────────────────────────────────────────────────

/// A handle to the background experiment task.
pub struct ExperimentHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl ExperimentHandle {
    /// Stop starting new trials. Trials already running finish on their own.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
