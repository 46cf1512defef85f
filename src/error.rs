// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed json in '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Git(#[from] git2::Error),

    /// A revert case whose target does not lie strictly inside its window.
    #[error("revert case violates start < target < base (start={start}, target={target}, base={base})")]
    InvalidCase {
        start: usize,
        target: usize,
        base: usize,
    },

    #[error("window start {start} lies after base {base}")]
    InvalidWindow { start: usize, base: usize },

    #[error("commit table holds {len} commits but the window reaches position {base}")]
    TableTooShort { len: usize, base: usize },

    #[error("regression curve declares degree {degree} but carries {coefficients} coefficients")]
    DegreeMismatch { degree: usize, coefficients: usize },

    #[error("regression curve has no coefficients")]
    EmptyCurve,
}
