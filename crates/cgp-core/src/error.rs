use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the CGP experiment toolkit.
#[derive(Error, Debug)]
pub enum CgpError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A benchmark problem cannot be built with the requested shape.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// No experiment output files were found under the given path.
    #[error("No result files found in {0}")]
    NoResultFiles(PathBuf),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the CGP crates.
pub type Result<T> = std::result::Result<T, CgpError>;
