// src/lib.rs

//! Weighted interpolation bisection over commit histories.
//!
//! For historical reverts with a known faulty commit inside a known search
//! window, measures how many probes an interpolation search needs when the
//! distance between commits is weighted by a pluggable metric, for
//! comparison with plain bisection.

pub mod analyzer;
pub mod bisect;
pub mod cli;
pub mod distance;
pub mod error;
pub mod logging;
pub mod model;
pub mod regfunc;
pub mod simulate;
pub mod stats;
pub mod weight;

pub use bisect::{binary_search_steps, BisectEngine};
pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use model::{CaseStats, CommitSummary, Dataset, Position, RevertCase};
pub use regfunc::{CurveKind, RegFunc};
pub use weight::{Measure, Profile, WeightFunction};
