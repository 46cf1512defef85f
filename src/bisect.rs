// src/bisect.rs

//! Interpolation bisection over a weighted history.
//!
//! Plain bisection probes the index midpoint of the remaining window. The
//! weighted engine probes the point halfway along the window's cumulative
//! weight instead, so metrics that concentrate weight in one part of the
//! window pull the probe towards it. Both share the same narrowing loop and
//! stop once `highest <= target + 1`.

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::model::{CaseStats, Dataset, Position, RevertCase};
use crate::weight::WeightFunction;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

pub struct BisectEngine<'m> {
    metric: &'m DistanceMetric,
}

impl<'m> BisectEngine<'m> {
    /// `metric` must already be compiled for the window being searched.
    pub fn new(metric: &'m DistanceMetric) -> Self {
        Self { metric }
    }

    /// Position lying `factor` of the way from `a` to `b` by cumulative weight.
    ///
    /// The stopping point comes from a forward walk over the gap weights, so
    /// ties on fractional weights break the same way for every window.
    pub fn interpolate(&self, a: Position, b: Position, factor: f64) -> Position {
        let (a, b, factor) = if b < a { (b, a, 1.0 - factor) } else { (a, b, factor) };
        let interval = self.metric.distance(a, b);
        let offset = (interval * factor + 0.5).floor();
        self.metric.walk(a, offset)
    }

    /// Number of probes needed to narrow `[start, base]` down to `target`.
    ///
    /// Requires `start < target <= base`.
    pub fn steps(&self, start: Position, base: Position, target: Position) -> usize {
        debug_assert!(start < target && target <= base, "invalid window {start}..{base} for {target}");

        let mut lowest = start;
        let mut highest = base;
        let mut count = 0;
        while highest > target + 1 {
            let mut current = self.interpolate(lowest + 1, highest - 1, 0.5);
            if current == highest {
                current -= 1;
            } else if current == lowest {
                current += 1;
            }

            if current < target {
                lowest = current;
            } else {
                highest = current;
            }
            count += 1;
            trace!(lowest, highest, current, "probe");
        }
        count
    }

    pub fn run(&self, case: &RevertCase) -> usize {
        self.steps(case.start(), case.base(), case.target())
    }
}

/// Step count of ordinary bisection, probing `round((lowest + highest) / 2)`.
pub fn binary_search_steps(start: Position, base: Position, target: Position) -> usize {
    let mut lowest = start;
    let mut highest = base;
    let mut count = 0;
    while highest > target + 1 {
        let current = (lowest + highest + 1) / 2;
        if current < target {
            lowest = current;
        } else {
            highest = current;
        }
        count += 1;
    }
    count
}

/// Compiles `metric` for the case's window and runs the engine over it.
pub fn evaluate(metric: &mut DistanceMetric, case: &RevertCase) -> Result<CaseStats> {
    metric.compile_range_weights(case.start(), case.base())?;
    let engine = BisectEngine::new(metric);
    Ok(CaseStats {
        steps: engine.run(case),
        distance: metric.distance(case.start(), case.base()),
        target_distance: metric.distance(case.start(), case.target()),
        commits: case.commits(),
    })
}

/// Results of running every revert case of one dataset
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub name: String,
    pub cases: Vec<CaseStats>,
    /// Reverts skipped because a referenced commit was absent
    pub missing: usize,
    /// Reverts skipped because the target was not inside the window
    pub inconsistent: usize,
}

impl Analysis {
    pub fn total_steps(&self) -> usize {
        self.cases.iter().map(|c| c.steps).sum()
    }
}

/// Runs every revert case in `dataset`, reusing the one metric cache.
pub fn analyse_dataset(name: &str, dataset: &Dataset, metric: &mut DistanceMetric) -> Result<Analysis> {
    let scan = dataset.revert_cases();
    debug!(
        dataset = name,
        commits = dataset.order.len(),
        reverts = scan.cases.len(),
        "scanned dataset"
    );

    metric.compile_global_weights(&dataset.commit_table());
    let cases = scan
        .cases
        .iter()
        .map(|case| evaluate(metric, case))
        .collect::<Result<Vec<_>>>()?;

    Ok(Analysis {
        name: name.to_string(),
        cases,
        missing: scan.missing,
        inconsistent: scan.inconsistent,
    })
}

pub fn analyse_file(path: &Path, weights: &WeightFunction) -> Result<Analysis> {
    let dataset = Dataset::load(path)?;
    let name = dataset
        .name
        .clone()
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_default();
    let mut metric = DistanceMetric::new(weights.clone());
    analyse_dataset(&name, &dataset, &mut metric)
}

/// Analyses each file on its own worker, each with a private metric.
/// Files that cannot be loaded or analysed are logged and left out.
pub fn analyse_files(paths: &[PathBuf], weights: &WeightFunction) -> Vec<Analysis> {
    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_message("Analysing datasets");

    let analyses: Vec<Analysis> = paths
        .par_iter()
        .progress_with(bar.clone())
        .filter_map(|path| match analyse_file(path, weights) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                None
            }
        })
        .collect();
    bar.finish_with_message("Analysis complete");

    for analysis in &analyses {
        if analysis.cases.is_empty() {
            info!(dataset = %analysis.name, "no revert cases");
        } else {
            info!(
                dataset = %analysis.name,
                cases = analysis.cases.len(),
                skipped_missing = analysis.missing,
                skipped_inconsistent = analysis.inconsistent,
                mean = analysis.total_steps() as f64 / analysis.cases.len() as f64,
                "analysed"
            );
        }
    }
    analyses
}

/// A single file, or every `*.json` file of a directory sorted by name.
pub fn dataset_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let entries = fs::read_dir(input).map_err(|source| Error::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| Error::Read {
                path: input.to_path_buf(),
                source,
            })?
            .path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        } else {
            debug!("skipping non-json file {}", path.display());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommitSummary;
    use crate::regfunc::RegFunc;
    use crate::weight::{Measure, Profile};

    fn constant_metric(start: Position, base: Position) -> DistanceMetric {
        let mut metric = DistanceMetric::new(WeightFunction::constant());
        metric.compile_range_weights(start, base).unwrap();
        metric
    }

    fn lines_metric(lines: &[u64], start: Position, base: Position) -> DistanceMetric {
        let table: Vec<CommitSummary> = lines
            .iter()
            .map(|&n| CommitSummary {
                lines_added: n,
                ..Default::default()
            })
            .collect();
        let mut metric = DistanceMetric::new(WeightFunction::Measured(Measure::Lines));
        metric.compile_global_weights(&table);
        metric.compile_range_weights(start, base).unwrap();
        metric
    }

    #[test]
    fn test_window_of_sixteen_matches_binary_search() {
        let metric = constant_metric(0, 16);
        let engine = BisectEngine::new(&metric);
        assert_eq!(engine.steps(0, 16, 7), binary_search_steps(0, 16, 7));
        assert_eq!(engine.steps(0, 16, 7), 1);
    }

    #[test]
    fn test_constant_weights_match_binary_search_exhaustively() {
        for base in 2..40 {
            let metric = constant_metric(0, base);
            let engine = BisectEngine::new(&metric);
            for target in 1..=base {
                assert_eq!(
                    engine.steps(0, base, target),
                    binary_search_steps(0, base, target),
                    "base={base} target={target}"
                );
            }
        }
    }

    #[test]
    fn test_heavy_end_found_faster() {
        let metric = lines_metric(&[5, 5, 5, 5, 5, 1, 1, 1, 1, 1, 1], 0, 10);
        let engine = BisectEngine::new(&metric);

        let heavy = engine.steps(0, 10, 3);
        let light = engine.steps(0, 10, 8);
        assert_eq!(heavy, 1);
        assert_eq!(light, 3);
        assert!(heavy < binary_search_steps(0, 10, 3));
    }

    #[test]
    fn test_target_at_base_takes_no_steps() {
        let metric = constant_metric(0, 10);
        assert_eq!(BisectEngine::new(&metric).steps(0, 10, 10), 0);
        assert_eq!(binary_search_steps(0, 10, 10), 0);
    }

    #[test]
    fn test_interpolate_is_symmetric_under_swap() {
        let metric = lines_metric(&[3, 1, 4, 1, 5, 9, 2, 6, 5, 3], 0, 9);
        let engine = BisectEngine::new(&metric);
        for factor in [0.0, 0.25, 0.5, 0.75, 1.0] {
            assert_eq!(engine.interpolate(2, 8, factor), engine.interpolate(8, 2, 1.0 - factor));
        }
        assert_eq!(engine.interpolate(2, 8, 0.0), 2);
        assert_eq!(engine.interpolate(2, 8, 1.0), 8);
    }

    #[test]
    fn test_interpolate_walks_fractional_weights() {
        // Only position 0 rises above the floor, so the gaps from 15 on weigh
        // exactly 1 while the prefix sums before them carry rounding error.
        let curve = RegFunc::polynomial(vec![1.2296, -4.6258, -2.9959], 0);
        let mut metric = DistanceMetric::new(WeightFunction::new(Measure::Commits, Some(curve)));
        metric.compile_range_weights(0, 17).unwrap();
        let engine = BisectEngine::new(&metric);

        assert_eq!(metric.weight(15), 1.0);
        assert_eq!(engine.interpolate(15, 17, 0.5), 16);
    }

    #[test]
    fn test_evaluate_reports_distances() {
        let table: Vec<CommitSummary> = (0..11u64)
            .map(|n| CommitSummary {
                files_changed: n % 3,
                ..Default::default()
            })
            .collect();
        let mut metric = DistanceMetric::new(WeightFunction::Measured(Measure::Files));
        metric.compile_global_weights(&table);

        let case = RevertCase::new(2, 10, 5).unwrap();
        let stats = evaluate(&mut metric, &case).unwrap();
        // files at positions 2..9: 2,0,1,2,0,1,2,0 -> weights 2,1,1,2,1,1,2,1
        assert_eq!(stats.distance, 11.0);
        assert_eq!(stats.target_distance, 4.0);
        assert_eq!(stats.commits, 8);
    }

    #[test]
    fn test_profiles_pull_the_first_probe() {
        let mut centre = DistanceMetric::new(WeightFunction::Profile(Profile::Centre));
        centre.compile_range_weights(0, 20).unwrap();
        let engine = BisectEngine::new(&centre);
        assert_eq!(engine.steps(0, 20, 10), 1);
        assert_eq!(engine.steps(0, 20, 1), 5);

        let mut edges = DistanceMetric::new(WeightFunction::Profile(Profile::Edges));
        edges.compile_range_weights(0, 20).unwrap();
        let engine = BisectEngine::new(&edges);
        assert_eq!(engine.steps(0, 20, 7), 1);
        assert_eq!(engine.steps(0, 20, 8), 1);
        assert_eq!(engine.steps(0, 20, 10), 4);
    }

    #[test]
    fn test_flat_regression_curve_is_plain_bisection() {
        let weights = WeightFunction::new(Measure::Commits, Some(RegFunc::polynomial(vec![0.5], 0)));
        let mut metric = DistanceMetric::new(weights);
        for target in 1..20 {
            let case = RevertCase::new(0, 20, target).unwrap();
            let stats = evaluate(&mut metric, &case).unwrap();
            assert_eq!(stats.steps, binary_search_steps(0, 20, target));
            assert_eq!(stats.distance, 20.0);
        }
    }
}
