// src/stats.rs

use crate::model::CaseStats;
use std::fmt;

/// Aggregate step statistics over a set of cases
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub total_steps: usize,
    pub mean: Option<f64>,
    /// Population standard deviation
    pub sd: Option<f64>,
    pub max_steps: usize,
    /// `histogram[k]` is the number of cases that took `k` steps
    pub histogram: Vec<usize>,
}

impl Summary {
    pub fn from_cases(cases: &[CaseStats]) -> Self {
        let count = cases.len();
        let total_steps: usize = cases.iter().map(|c| c.steps).sum();
        let max_steps = cases.iter().map(|c| c.steps).max().unwrap_or(0);

        let mut histogram = vec![0; if count == 0 { 0 } else { max_steps + 1 }];
        for case in cases {
            histogram[case.steps] += 1;
        }

        let (mean, sd) = if count == 0 {
            (None, None)
        } else {
            let mean = total_steps as f64 / count as f64;
            let variance = cases
                .iter()
                .map(|c| (c.steps as f64 - mean).powi(2))
                .sum::<f64>()
                / count as f64;
            (Some(mean), Some(variance.sqrt()))
        };

        Self {
            count,
            total_steps,
            mean,
            sd,
            max_steps,
            histogram,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mean, self.sd) {
            (Some(mean), Some(sd)) => {
                writeln!(f, "Cases: {}", self.count)?;
                writeln!(f, "Mean:  {mean}")?;
                writeln!(f, "SD:    {sd}")?;
                write!(f, "Combined: {mean:.3} & {sd:.3}")
            }
            _ => write!(f, "No entries"),
        }
    }
}

/// Histogram of where targets sit in their windows, as the proportion
/// `target_distance / distance` split into `buckets` equal bins.
pub fn target_buckets(cases: &[CaseStats], buckets: usize) -> Vec<usize> {
    let mut counts = vec![0; buckets];
    if buckets == 0 {
        return counts;
    }
    for case in cases.iter().filter(|c| c.distance > 0.0) {
        let proportion = case.target_distance / case.distance;
        let bucket = ((buckets as f64 * proportion).floor() as usize).min(buckets - 1);
        counts[bucket] += 1;
    }
    counts
}

/// Frequency points for fitting a weight curve: `x_i = (i + 1) / n` and
/// `y_i` the number of targets in bucket `i`.
pub fn frequency_points(cases: &[CaseStats], buckets: usize) -> (Vec<f64>, Vec<f64>) {
    let xs = (0..buckets).map(|i| (i + 1) as f64 / buckets as f64).collect();
    let ys = target_buckets(cases, buckets).into_iter().map(|n| n as f64).collect();
    (xs, ys)
}
