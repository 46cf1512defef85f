// src/simulate.rs

//! Synthetic comparison of plain and lines-weighted bisection.
//!
//! Each run draws a random history, assigns every commit a random number of
//! changed lines, and places the faulty commit by picking a changed line
//! uniformly at random. Both searches then look for it over the whole history.

use crate::bisect::{binary_search_steps, BisectEngine};
use crate::distance::DistanceMetric;
use crate::error::Result;
use crate::model::CommitSummary;
use crate::weight::{Measure, WeightFunction};
use indicatif::{ParallelProgressIterator, ProgressBar};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::fmt;
use std::ops::Add;

#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    /// Histories of every length bound in `3..max_commits` are simulated
    pub max_commits: usize,
    /// Each commit changes between 1 and this many lines
    pub max_lines: u64,
    /// Runs per length bound
    pub runs: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub runs: usize,
    pub regular_better: usize,
    pub weighted_better: usize,
    pub ties: usize,
    pub regular_steps: usize,
    pub weighted_steps: usize,
}

impl SimulationReport {
    fn record(&mut self, regular: usize, weighted: usize) {
        self.runs += 1;
        self.regular_steps += regular;
        self.weighted_steps += weighted;
        match regular.cmp(&weighted) {
            std::cmp::Ordering::Less => self.regular_better += 1,
            std::cmp::Ordering::Greater => self.weighted_better += 1,
            std::cmp::Ordering::Equal => self.ties += 1,
        }
    }

    pub fn regular_mean(&self) -> Option<f64> {
        (self.runs > 0).then(|| self.regular_steps as f64 / self.runs as f64)
    }

    pub fn weighted_mean(&self) -> Option<f64> {
        (self.runs > 0).then(|| self.weighted_steps as f64 / self.runs as f64)
    }
}

impl Add for SimulationReport {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            runs: self.runs + other.runs,
            regular_better: self.regular_better + other.regular_better,
            weighted_better: self.weighted_better + other.weighted_better,
            ties: self.ties + other.ties,
            regular_steps: self.regular_steps + other.regular_steps,
            weighted_steps: self.weighted_steps + other.weighted_steps,
        }
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Runs: {} Regular better: {} Weighted better: {} Ties: {}",
            self.runs, self.regular_better, self.weighted_better, self.ties
        )?;
        if let (Some(regular), Some(weighted)) = (self.regular_mean(), self.weighted_mean()) {
            write!(f, "\nMean steps: regular {regular:.3} weighted {weighted:.3}")?;
        }
        Ok(())
    }
}

/// One random history: returns (plain steps, weighted steps).
fn run_once(rng: &mut StdRng, metric: &mut DistanceMetric, bound: usize, max_lines: u64) -> Result<(usize, usize)> {
    let commits = rng.gen_range(3..=bound);

    // The extra entry is the window's base; only gaps before it carry weight.
    let mut table: Vec<CommitSummary> = (0..commits)
        .map(|_| CommitSummary {
            lines_added: rng.gen_range(1..=max_lines),
            ..Default::default()
        })
        .collect();
    let total: u64 = table.iter().map(|c| c.lines_added).sum();
    table.push(CommitSummary::default());

    let bad_line = rng.gen_range(0..total);
    let mut seen = 0;
    let faulty = table
        .iter()
        .position(|c| {
            seen += c.lines_added;
            seen > bad_line
        })
        .unwrap_or(commits - 1);
    let target = faulty + 1;

    metric.compile_global_weights(&table);
    metric.compile_range_weights(0, commits)?;
    let weighted = BisectEngine::new(metric).steps(0, commits, target);
    Ok((binary_search_steps(0, commits, target), weighted))
}

pub fn simulate(config: &SimulationConfig) -> Result<SimulationReport> {
    let bounds: Vec<usize> = (3..config.max_commits).collect();
    let max_lines = config.max_lines.max(1);

    let bar = ProgressBar::new(bounds.len() as u64);
    bar.set_message("Simulating");

    let reports = bounds
        .par_iter()
        .progress_with(bar.clone())
        .map(|&bound| -> Result<SimulationReport> {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(bound as u64));
            let mut metric = DistanceMetric::new(WeightFunction::Measured(Measure::Lines));
            let mut report = SimulationReport::default();
            for _ in 0..config.runs {
                let (regular, weighted) = run_once(&mut rng, &mut metric, bound, max_lines)?;
                report.record(regular, weighted);
            }
            Ok(report)
        })
        .collect::<Result<Vec<_>>>()?;
    bar.finish_with_message("Simulation complete");

    Ok(reports.into_iter().fold(SimulationReport::default(), Add::add))
}
