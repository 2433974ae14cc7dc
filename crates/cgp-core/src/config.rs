//! Experiment configuration files.
//!
//! Configurations are JSON objects. Several files can be layered: keys from
//! later files replace keys from earlier ones, so a shared base file can be
//! combined with small per-experiment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CgpError, Result};
use crate::evolution::{EvolutionParams, Speed};
use crate::individual::Layout;
use crate::problems::ProblemKind;

fn default_off_size() -> usize {
    4
}

fn default_max_fitness() -> f64 {
    1.0
}

fn default_runs() -> usize {
    1
}

// ── ExperimentConfig ──────────────────────────────────────────────────────────

/// Everything needed to run one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Benchmark to evolve a circuit for.
    pub problem: ProblemKind,
    /// Number of input variables.
    pub input_length: usize,
    /// Number of outputs; derived from the problem when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_length: Option<usize>,
    /// Nodes in the CGP graph.
    pub graph_length: usize,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    /// Offspring per generation.
    #[serde(default = "default_off_size")]
    pub off_size: usize,
    #[serde(default)]
    pub speed: Speed,
    /// Evaluation budget per run.
    pub max_evals: u64,
    /// Fitness that ends a run as solved.
    #[serde(default = "default_max_fitness")]
    pub max_fitness: f64,
    /// Independent runs to perform.
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Base seed; run `i` uses `seed + i`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Base path for result files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Maximum runs executing at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl ExperimentConfig {
    /// Output count, checking a declared value against the problem.
    pub fn resolved_output_length(&self) -> Result<usize> {
        let derived = self.problem.output_length(self.input_length)?;
        match self.output_length {
            Some(declared) if declared != derived => Err(CgpError::Config(format!(
                "output_length {declared} does not match {} with {} inputs (expects {derived})",
                self.problem, self.input_length
            ))),
            _ => Ok(derived),
        }
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.graph_length == 0 {
            return Err(CgpError::Config("graph_length must be at least 1".into()));
        }
        if self.input_length == 0 {
            return Err(CgpError::Config("input_length must be at least 1".into()));
        }
        if !(self.mutation_rate > 0.0 && self.mutation_rate <= 1.0) {
            return Err(CgpError::Config(format!(
                "mutation_rate must be in (0, 1], got {}",
                self.mutation_rate
            )));
        }
        if self.off_size == 0 {
            return Err(CgpError::Config("off_size must be at least 1".into()));
        }
        if self.max_evals == 0 {
            return Err(CgpError::Config("max_evals must be at least 1".into()));
        }
        if self.runs == 0 {
            return Err(CgpError::Config("runs must be at least 1".into()));
        }
        if self.workers == Some(0) {
            return Err(CgpError::Config("workers must be at least 1".into()));
        }
        self.resolved_output_length()?;
        Ok(())
    }

    /// Genome layout for this experiment.
    pub fn layout(&self) -> Result<Layout> {
        Layout::new(
            self.graph_length,
            self.input_length,
            self.resolved_output_length()?,
            self.problem.functions(),
        )
    }

    /// Search parameters for a single run.
    pub fn params(&self) -> EvolutionParams {
        EvolutionParams {
            mutation_rate: self.mutation_rate,
            off_size: self.off_size,
            speed: self.speed,
            max_evals: self.max_evals,
            max_fitness: self.max_fitness,
        }
    }

    /// Key shared by configurations that differ only in how wasted
    /// evaluations are handled or where and how they were run.
    pub fn comparison_key(&self) -> String {
        let mut normalized = self.clone();
        normalized.speed = Speed::Normal;
        normalized.seed = None;
        normalized.output = None;
        normalized.workers = None;
        normalized.output_length = None;
        serde_json::to_string(&normalized).unwrap_or_default()
    }
}

// ── Loading & saving ──────────────────────────────────────────────────────────

/// Merge the JSON objects in `paths` (later keys win) into one object.
pub fn merge_configuration_files<P: AsRef<Path>>(
    paths: &[P],
) -> Result<serde_json::Map<String, serde_json::Value>> {
    let mut merged = serde_json::Map::new();
    for path in paths {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CgpError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        match serde_json::from_str(&content)? {
            serde_json::Value::Object(map) => merged.extend(map),
            _ => {
                return Err(CgpError::Config(format!(
                    "{} does not contain a JSON object",
                    path.display()
                )))
            }
        }
    }
    Ok(merged)
}

/// Load and merge configuration files into an [`ExperimentConfig`].
pub fn load_configurations<P: AsRef<Path>>(paths: &[P]) -> Result<ExperimentConfig> {
    if paths.is_empty() {
        return Err(CgpError::Config("no configuration files given".into()));
    }
    let merged = merge_configuration_files(paths)?;
    Ok(serde_json::from_value(serde_json::Value::Object(merged))?)
}

/// Load a single configuration file.
pub fn load_configuration(path: &Path) -> Result<ExperimentConfig> {
    load_configurations(&[path])
}

/// Atomically write `config` to `path` as JSON, creating parent directories
/// if needed.
pub fn save_configuration(path: &Path, config: &ExperimentConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    write_atomic(path, json.as_bytes())
}

/// Write to a temp file next to `path`, then rename over it.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let wrap = |source| CgpError::FileWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents).map_err(wrap)?;
    std::fs::rename(&tmp, path).map_err(wrap)?;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).expect("write config");
        path
    }

    fn base() -> ExperimentConfig {
        serde_json::from_str(
            r#"{"problem": "even_parity", "input_length": 3, "graph_length": 50,
                "mutation_rate": 0.02, "max_evals": 1000}"#,
        )
        .expect("parse base config")
    }

    #[test]
    fn test_defaults_applied() {
        let config = base();
        assert_eq!(config.off_size, 4);
        assert_eq!(config.speed, Speed::Normal);
        assert_eq!(config.max_fitness, 1.0);
        assert_eq!(config.runs, 1);
        assert!(config.seed.is_none());
        assert!(config.output.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_later_files_override_earlier() {
        let tmp = TempDir::new().expect("tempdir");
        let a = write(
            &tmp,
            "base.json",
            r#"{"problem": "even_parity", "input_length": 3, "graph_length": 50,
                "mutation_rate": 0.02, "max_evals": 1000, "speed": "normal"}"#,
        );
        let b = write(&tmp, "skip.json", r#"{"speed": "skip", "runs": 10}"#);

        let config = load_configurations(&[a, b]).expect("load");
        assert_eq!(config.speed, Speed::Skip);
        assert_eq!(config.runs, 10);
        assert_eq!(config.graph_length, 50);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let tmp = TempDir::new().expect("tempdir");
        let a = write(
            &tmp,
            "cfg.json",
            r#"{"problem": "binary_encode", "input_length": 8, "graph_length": 100,
                "mutation_rate": 0.01, "max_evals": 10, "verbose": true}"#,
        );
        let config = load_configuration(&a).expect("load");
        assert_eq!(config.resolved_output_length().unwrap(), 3);
    }

    #[test]
    fn test_load_errors() {
        let tmp = TempDir::new().expect("tempdir");
        let empty: [PathBuf; 0] = [];
        assert!(matches!(load_configurations(&empty), Err(CgpError::Config(_))));

        let missing = tmp.path().join("missing.json");
        assert!(matches!(
            load_configuration(&missing),
            Err(CgpError::FileRead { .. })
        ));

        let list = write(&tmp, "list.json", "[1, 2]");
        assert!(matches!(load_configuration(&list), Err(CgpError::Config(_))));

        let broken = write(&tmp, "broken.json", "{not json");
        assert!(matches!(
            load_configuration(&broken),
            Err(CgpError::JsonParse(_))
        ));

        let incomplete = write(&tmp, "incomplete.json", r#"{"problem": "even_parity"}"#);
        assert!(matches!(
            load_configuration(&incomplete),
            Err(CgpError::JsonParse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = base();
        config.mutation_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = base();
        config.mutation_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = base();
        config.off_size = 0;
        assert!(config.validate().is_err());

        let mut config = base();
        config.runs = 0;
        assert!(config.validate().is_err());

        let mut config = base();
        config.workers = Some(0);
        assert!(config.validate().is_err());

        let mut config = base();
        config.output_length = Some(2);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output_length 2"));
    }

    #[test]
    fn test_layout_and_params() {
        let mut config = base();
        config.speed = Speed::Accumulate;
        let layout = config.layout().expect("layout");
        assert_eq!(layout.graph_length, 50);
        assert_eq!(layout.output_length, 1);
        assert_eq!(layout.max_arity, 2);

        let params = config.params();
        assert_eq!(params.speed, Speed::Accumulate);
        assert_eq!(params.max_evals, 1000);
    }

    #[test]
    fn test_comparison_key_ignores_speed_and_seed() {
        let a = base();
        let mut b = base();
        b.speed = Speed::Single;
        b.seed = Some(99);
        b.output = Some(PathBuf::from("out/single"));
        assert_eq!(a.comparison_key(), b.comparison_key());

        let mut c = base();
        c.mutation_rate = 0.5;
        assert_ne!(a.comparison_key(), c.comparison_key());
    }

    #[test]
    fn test_save_and_load_configuration() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("nested").join("exp.cfg.json");
        let mut config = base();
        config.seed = Some(7);

        save_configuration(&path, &config).expect("save");
        assert!(path.exists());
        assert!(!tmp.path().join("nested").join("exp.cfg.json.tmp").exists());

        let loaded = load_configuration(&path).expect("load");
        assert_eq!(loaded, config);
    }
}
