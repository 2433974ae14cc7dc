//! Discovery and loading of experiment output written by [`crate::writer`].

use std::path::{Path, PathBuf};

use cgp_core::config::load_configuration;
use cgp_core::error::{CgpError, Result};
use cgp_core::models::{Experiment, RunRecord};
use tracing::{debug, warn};

/// Suffix of the configuration half of an experiment.
pub const CONFIG_SUFFIX: &str = ".cfg.json";

/// Suffix of the run-record half of an experiment.
pub const RESULTS_SUFFIX: &str = ".json";

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all experiment configuration files recursively under `dir`, sorted
/// by path.
pub fn find_result_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Result path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_config_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load the run records stored at `path`.
pub fn load_runs(path: &Path) -> Result<Vec<RunRecord>> {
    let content = std::fs::read_to_string(path).map_err(|source| CgpError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut runs: Vec<RunRecord> = serde_json::from_str(&content)?;
    runs.sort_by_key(|r| r.run);
    Ok(runs)
}

/// Load both halves of the experiment whose configuration is at `cfg_path`.
pub fn load_experiment(cfg_path: &Path) -> Result<Experiment> {
    let base = base_of(cfg_path);
    let config = load_configuration(cfg_path)?;
    let runs = load_runs(&crate::writer::results_path(&base))?;
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!("Loaded {} runs for {}", runs.len(), name);
    Ok(Experiment { name, config, runs })
}

/// Load every experiment reachable from `paths`.
///
/// Directories are searched recursively. A file may name either half of an
/// experiment. Experiments that fail to load are logged and skipped.
pub fn load_experiments(paths: &[PathBuf]) -> Result<Vec<Experiment>> {
    let mut cfg_files = Vec::new();
    for path in paths {
        if path.is_dir() {
            cfg_files.extend(find_result_files(path));
        } else if is_config_file(path) {
            cfg_files.push(path.clone());
        } else {
            cfg_files.push(crate::writer::config_path(&strip_suffix(path, RESULTS_SUFFIX)));
        }
    }

    let mut experiments = Vec::new();
    for cfg in &cfg_files {
        match load_experiment(cfg) {
            Ok(experiment) => experiments.push(experiment),
            Err(e) => warn!("Skipping {}: {}", cfg.display(), e),
        }
    }

    if experiments.is_empty() {
        let first = paths.first().cloned().unwrap_or_default();
        return Err(CgpError::NoResultFiles(first));
    }
    Ok(experiments)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_config_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(CONFIG_SUFFIX))
        .unwrap_or(false)
}

fn base_of(cfg_path: &Path) -> PathBuf {
    strip_suffix(cfg_path, CONFIG_SUFFIX)
}

fn strip_suffix(path: &Path, suffix: &str) -> PathBuf {
    let text = path.to_string_lossy();
    match text.strip_suffix(suffix) {
        Some(stem) => PathBuf::from(stem),
        None => path.to_path_buf(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
