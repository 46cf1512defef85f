// src/cli.rs

use crate::regfunc::CurveKind;
use crate::weight::{Measure, Profile};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record change sizes and reverts of a local git repository
    Collect {
        /// Path to the git repository to analyze
        #[arg(short, long)]
        repo: PathBuf,

        /// Dataset file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Name stored in the dataset (defaults to the repository directory)
        #[arg(long)]
        name: Option<String>,
    },

    /// Run the weighted bisection over every revert in one or more datasets
    Analyse {
        /// A dataset file, or a directory of them
        #[arg(short, long)]
        input: PathBuf,

        /// File to write per-case results to
        #[arg(short, long)]
        output: PathBuf,

        /// Quantity the distance between commits is measured in
        #[arg(long, value_enum, default_value_t = Measure::Commits)]
        metric: Measure,

        /// Fixed weight shape over each window instead of a measured quantity
        #[arg(long, value_enum, conflicts_with_all = ["metric", "curve", "regfunc"])]
        profile: Option<Profile>,

        #[command(flatten)]
        curve: CurveArgs,
    },

    /// Summarise result files written by `analyse`
    Stats {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Number of target position buckets
        #[arg(long, default_value_t = 100)]
        buckets: usize,
    },

    /// Compare plain and lines-weighted bisection on random histories
    Simulate {
        /// Upper bound on history length
        #[arg(long, default_value_t = 100)]
        max_commits: usize,

        /// Upper bound on lines changed per commit
        #[arg(long, default_value_t = 100)]
        max_lines: u64,

        /// Runs per history length
        #[arg(long, default_value_t = 10)]
        runs: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

/// Regression curve used to weight the chosen metric
#[derive(clap::Args, Debug, Clone)]
pub struct CurveArgs {
    /// Curve family, for inline coefficients
    #[arg(long, value_enum, requires = "coefficients", conflicts_with = "regfunc")]
    pub curve: Option<CurveKind>,

    /// Coefficients from the constant term upwards
    #[arg(long, num_args = 1.., allow_negative_numbers = true, requires = "curve")]
    pub coefficients: Vec<f64>,

    /// Lowest power of a polynomial curve is `x^-N`
    #[arg(long, default_value_t = 0)]
    pub negative_power: i32,

    /// JSON curve descriptor: {kind, degree, negative_power_offset, coefficients}
    #[arg(long)]
    pub regfunc: Option<PathBuf>,
}
