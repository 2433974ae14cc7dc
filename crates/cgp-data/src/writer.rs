//! Writing experiment output.
//!
//! An experiment with base path `output/parity_skip` produces two files:
//! `output/parity_skip.json` holding the run records and
//! `output/parity_skip.cfg.json` holding the resolved configuration.

use std::path::{Path, PathBuf};

use cgp_core::config::{save_configuration, write_atomic, ExperimentConfig};
use cgp_core::error::Result;
use cgp_core::models::RunRecord;
use serde::Serialize;
use tracing::info;

use crate::reader::{CONFIG_SUFFIX, RESULTS_SUFFIX};

/// Path of the run-record file for `base`.
pub fn results_path(base: &Path) -> PathBuf {
    with_suffix(base, RESULTS_SUFFIX)
}

/// Path of the configuration file for `base`.
pub fn config_path(base: &Path) -> PathBuf {
    with_suffix(base, CONFIG_SUFFIX)
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Render `items` as a JSON array with one element per line.
pub fn render_list<T: Serialize>(items: &[T]) -> Result<String> {
    let mut out = String::from("[\n");
    for (index, item) in items.iter().enumerate() {
        out.push_str(&serde_json::to_string(item)?);
        if index + 1 != items.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("]\n");
    Ok(out)
}

/// Write `items` to `path` as a line-per-element JSON array.
pub fn save_list<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    write_atomic(path, render_list(items)?.as_bytes())
}

/// Write the run records and configuration of an experiment next to `base`.
///
/// Returns `(results_path, config_path)`.
pub fn write_experiment(
    base: &Path,
    config: &ExperimentConfig,
    runs: &[RunRecord],
) -> Result<(PathBuf, PathBuf)> {
    let results = results_path(base);
    let cfg = config_path(base);
    save_list(&results, runs)?;
    save_configuration(&cfg, config)?;
    info!(
        "Wrote {} runs to {} (config {})",
        runs.len(),
        results.display(),
        cfg.display()
    );
    Ok((results, cfg))
}
