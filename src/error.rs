use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while selecting, loading and analyzing trajectories
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No input files selected: {0}")]
    Selection(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid schema: {0}")]
    Schema(String),

    #[error("Trajectory {0} contains no snapshots")]
    EmptyTrajectory(PathBuf),

    #[error("Snapshot at step {step} contains no particles")]
    EmptySnapshot { step: i64 },

    #[error("Snapshot at step {step} has no position columns")]
    MissingPositions { step: i64 },

    #[error("Window size must be at least 1, got {0}")]
    InvalidWindow(usize),

    #[error("Particle counts ({n}) and distances ({r}) differ in length")]
    LengthMismatch { n: usize, r: usize },

    #[error("Regression needs more than 2 points, got {0}")]
    InsufficientPoints(usize),

    #[error("Logarithm of non-positive value: {0}")]
    NonPositiveLogArgument(String),

    #[error("Degenerate fit: every chain has n = 2, so log10(n - 1) is zero")]
    DegenerateFit,

    #[error("CSV error on {path}: {message}")]
    Csv { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
