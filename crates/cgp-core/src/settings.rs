use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ExperimentConfig;
use crate::evolution::Speed;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Experiments on wasted evaluations in Cartesian Genetic Programming
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cgp-waste",
    about = "Experiments on wasted evaluations in Cartesian Genetic Programming",
    version
)]
pub struct Settings {
    /// Logging level
    #[arg(
        long,
        global = true,
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Log file path (logs go to stderr when absent)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the experiment described by one or more configuration files
    Run(RunArgs),
    /// Summarize experiment output and compare speeds
    Analyze(AnalyzeArgs),
    /// Print the predicted amounts of wasted evaluations
    Predict(PredictArgs),
}

/// Arguments of `cgp-waste run`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Configuration files, merged in order (later files win)
    #[arg(required = true)]
    pub configs: Vec<PathBuf>,

    /// Number of independent runs
    #[arg(long)]
    pub runs: Option<usize>,

    /// Base random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// How offspring identical to their parent are handled
    #[arg(long, value_parser = clap::value_parser!(Speed))]
    pub speed: Option<Speed>,

    /// Per-gene mutation probability
    #[arg(long)]
    pub mutation_rate: Option<f64>,

    /// Evaluation budget per run
    #[arg(long)]
    pub max_evals: Option<u64>,

    /// Base path for result files
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum number of runs executing at once
    #[arg(long)]
    pub workers: Option<usize>,
}

impl RunArgs {
    /// Overwrite `config` with every flag given on the command line.
    pub fn apply_overrides(&self, config: &mut ExperimentConfig) {
        if let Some(runs) = self.runs {
            config.runs = runs;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        if let Some(rate) = self.mutation_rate {
            config.mutation_rate = rate;
        }
        if let Some(max_evals) = self.max_evals {
            config.max_evals = max_evals;
        }
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
    }
}

/// Arguments of `cgp-waste analyze`.
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Result files (`*.cfg.json`) or directories to search
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Speed the other speeds are compared against
    #[arg(long, default_value = "normal", value_parser = clap::value_parser!(Speed))]
    pub baseline: Speed,

    /// Emit JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `cgp-waste predict`.
#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Mutation rates to tabulate
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = vec![0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1]
    )]
    pub rates: Vec<f64>,

    /// Active node counts to tabulate
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = vec![1usize, 5, 10, 25, 50, 100, 200]
    )]
    pub active: Vec<usize>,

    /// Arity of every node
    #[arg(long, default_value_t = 2)]
    pub max_arity: usize,

    /// Number of outputs
    #[arg(long, default_value_t = 1)]
    pub output_length: usize,

    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply the `--debug` flag.
    pub fn load() -> Self {
        Self::parse().resolve()
    }

    /// Same as [`Settings::load`] but from an explicit argument list.
    pub fn load_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::try_parse_from(args)?.resolve())
    }

    fn resolve(mut self) -> Self {
        // --debug overrides log level.
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(settings: Settings) -> RunArgs {
        match settings.command {
            Command::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    fn base_config() -> ExperimentConfig {
        serde_json::from_str(
            r#"{"problem": "binary_multiply", "input_length": 4, "graph_length": 100,
                "mutation_rate": 0.01, "max_evals": 5000, "runs": 3}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::load_from(["cgp-waste", "run", "cfg/a.json"]).unwrap();
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);

        let args = run_args(settings);
        assert_eq!(args.configs, vec![PathBuf::from("cfg/a.json")]);
        assert!(args.runs.is_none());
        assert!(args.speed.is_none());
        assert!(args.output.is_none());
    }

    #[test]
    fn test_settings_debug_overrides_log_level() {
        let settings =
            Settings::load_from(["cgp-waste", "--log-level", "ERROR", "--debug", "predict"])
                .unwrap();
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let settings = Settings::load_from([
            "cgp-waste",
            "analyze",
            "output",
            "--log-file",
            "/tmp/cgp.log",
        ])
        .unwrap();
        assert_eq!(settings.log_file, Some(PathBuf::from("/tmp/cgp.log")));
    }

    #[test]
    fn test_run_requires_config() {
        assert!(Settings::load_from(["cgp-waste", "run"]).is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        assert!(Settings::load_from(["cgp-waste", "--log-level", "TRACE", "predict"]).is_err());
    }

    #[test]
    fn test_run_overrides_applied() {
        let settings = Settings::load_from([
            "cgp-waste",
            "run",
            "base.json",
            "skip.json",
            "--runs",
            "50",
            "--seed",
            "7",
            "--speed",
            "accumulate",
            "--mutation-rate",
            "0.04",
            "-o",
            "output/multiply",
            "--workers",
            "2",
        ])
        .unwrap();
        let args = run_args(settings);
        assert_eq!(args.configs.len(), 2);

        let mut config = base_config();
        args.apply_overrides(&mut config);
        assert_eq!(config.runs, 50);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.speed, Speed::Accumulate);
        assert_eq!(config.mutation_rate, 0.04);
        assert_eq!(config.max_evals, 5000);
        assert_eq!(config.output, Some(PathBuf::from("output/multiply")));
        assert_eq!(config.workers, Some(2));
    }

    #[test]
    fn test_run_without_overrides_keeps_config() {
        let args = run_args(Settings::load_from(["cgp-waste", "run", "a.json"]).unwrap());
        let mut config = base_config();
        args.apply_overrides(&mut config);
        assert_eq!(config, base_config());
    }

    #[test]
    fn test_unknown_speed_rejected() {
        assert!(Settings::load_from(["cgp-waste", "run", "a.json", "--speed", "turbo"]).is_err());
    }

    #[test]
    fn test_analyze_defaults() {
        let settings = Settings::load_from(["cgp-waste", "analyze", "output"]).unwrap();
        match settings.command {
            Command::Analyze(args) => {
                assert_eq!(args.baseline, Speed::Normal);
                assert!(!args.json);
                assert_eq!(args.paths, vec![PathBuf::from("output")]);
            }
            other => panic!("expected analyze, got {other:?}"),
        }
    }

    #[test]
    fn test_predict_lists() {
        let settings =
            Settings::load_from(["cgp-waste", "predict", "--rates", "0.01,0.1", "--active", "3"])
                .unwrap();
        match settings.command {
            Command::Predict(args) => {
                assert_eq!(args.rates, vec![0.01, 0.1]);
                assert_eq!(args.active, vec![3]);
                assert_eq!(args.max_arity, 2);
                assert_eq!(args.output_length, 1);
            }
            other => panic!("expected predict, got {other:?}"),
        }
    }

    #[test]
    fn test_predict_defaults() {
        let settings = Settings::load_from(["cgp-waste", "predict"]).unwrap();
        match settings.command {
            Command::Predict(args) => {
                assert_eq!(args.rates.len(), 7);
                assert_eq!(args.active.len(), 7);
            }
            other => panic!("expected predict, got {other:?}"),
        }
    }
}
