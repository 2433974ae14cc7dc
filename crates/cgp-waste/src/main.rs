mod bootstrap;
mod report;

use std::time::Instant;

use anyhow::{bail, Result};
use cgp_core::config::load_configurations;
use cgp_core::models::Experiment;
use cgp_core::prediction::predict_waste;
use cgp_core::settings::{AnalyzeArgs, Command, PredictArgs, RunArgs, Settings};
use cgp_data::aggregator::ExperimentAggregator;
use cgp_data::analysis::analyze_experiments;
use cgp_data::writer::write_experiment;
use cgp_runtime::orchestrator::ExperimentOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("cgp-waste v{} starting", env!("CARGO_PKG_VERSION"));

    match settings.command {
        Command::Run(args) => run(args).await,
        Command::Analyze(args) => analyze(args),
        Command::Predict(args) => predict(args),
    }
}

/// Load and validate the experiment, then create its output directory.
fn prepare_run(args: &RunArgs) -> Result<ExperimentOrchestrator> {
    let mut config = load_configurations(&args.configs)?;
    args.apply_overrides(&mut config);
    let orchestrator = ExperimentOrchestrator::new(config)?;
    if let Some(base) = &orchestrator.resolved_config().output {
        bootstrap::ensure_output_dir(base)?;
    }
    Ok(orchestrator)
}

async fn run(args: RunArgs) -> Result<()> {
    let orchestrator = prepare_run(&args)?;
    let config = orchestrator.resolved_config();
    let base_seed = orchestrator.base_seed();
    tracing::info!(
        "Running {} x {} ({} inputs, graph {}, rate {}, speed {}) on {} workers, base seed {}",
        config.runs,
        config.problem,
        config.input_length,
        config.graph_length,
        config.mutation_rate,
        config.speed,
        orchestrator.workers(),
        base_seed
    );

    let started = Instant::now();
    let (mut rx, handle) = orchestrator.start();
    let mut records = Vec::with_capacity(config.runs);
    let mut interrupted = false;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    // Ctrl+C stops new trials; the ones already running still report.
    loop {
        tokio::select! {
            report = rx.recv() => match report {
                Some(report) => {
                    tracing::info!(
                        "Run {}/{} finished: {} evals, success={}, skipped={}",
                        report.completed,
                        report.total,
                        report.record.evals,
                        report.record.success,
                        report.record.skipped
                    );
                    records.push(report.record);
                }
                None => break,
            },
            _ = &mut ctrl_c, if !interrupted => {
                tracing::warn!("Ctrl+C received; waiting for running trials");
                handle.abort();
                interrupted = true;
            }
        }
    }
    records.sort_by_key(|r| r.run);
    let elapsed = started.elapsed().as_secs_f64();

    if records.is_empty() {
        bail!("no trial finished");
    }
    if records.len() < config.runs {
        tracing::warn!("Only {} of {} runs finished", records.len(), config.runs);
    }

    if let Some(base) = &config.output {
        write_experiment(base, &config, &records)?;
    }

    let name = config
        .output
        .as_ref()
        .and_then(|base| base.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}-{}", config.problem, config.speed));
    let experiment = Experiment {
        name,
        config,
        runs: records,
    };
    let summary = ExperimentAggregator::summarize(&experiment);
    print!("{}", report::run_summary(&summary, base_seed, elapsed));

    Ok(())
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let analysis = analyze_experiments(&args.paths, args.baseline)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    print!("{}", report::summaries_table(&analysis.summaries));
    if analysis.comparisons.is_empty() {
        println!("\nNo experiments to compare against baseline {}", analysis.baseline);
    } else {
        println!("\nCompared against {}:", analysis.baseline);
        print!("{}", report::comparisons_table(&analysis.comparisons));
    }
    Ok(())
}

fn predict(args: PredictArgs) -> Result<()> {
    if let Some(rate) = args.rates.iter().find(|r| !(0.0..=1.0).contains(*r)) {
        bail!("mutation rate {rate} is outside [0, 1]");
    }

    let table = predict_waste(&args.rates, &args.active, args.max_arity, args.output_length);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        print!("{}", report::prediction_table(&table));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn run_args(config: &Path, output: &Path) -> RunArgs {
        let settings = Settings::load_from([
            Path::new("cgp-waste"),
            Path::new("run"),
            config,
            Path::new("--output"),
            output,
        ])
        .unwrap();
        match settings.command {
            Command::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    fn write_config(dir: &TempDir, mutation_rate: f64) -> std::path::PathBuf {
        let path = dir.path().join("parity.json");
        let body = format!(
            r#"{{"problem": "even_parity", "input_length": 3, "graph_length": 20,
                "mutation_rate": {mutation_rate}, "max_evals": 100, "seed": 3}}"#
        );
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_prepare_run_invalid_config_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let config = write_config(&tmp, 0.0);
        let output = tmp.path().join("results").join("parity");

        assert!(prepare_run(&run_args(&config, &output)).is_err());
        assert!(!tmp.path().join("results").exists());
    }

    #[test]
    fn test_prepare_run_creates_output_dir() {
        let tmp = TempDir::new().unwrap();
        let config = write_config(&tmp, 0.05);
        let output = tmp.path().join("results").join("parity");

        let orchestrator = prepare_run(&run_args(&config, &output)).unwrap();
        assert_eq!(orchestrator.base_seed(), 3);
        assert!(tmp.path().join("results").is_dir());
    }
}
