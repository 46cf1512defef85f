// src/weight.rs

use crate::model::{CommitSummary, Position};
use crate::regfunc::RegFunc;
use serde::{Deserialize, Serialize};

/// Quantity a distance metric is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Every commit counts as 1
    Commits,
    /// Lines added plus lines removed
    Lines,
    /// Diff hunks
    Blocks,
    Files,
}

impl Measure {
    /// Measured quantity of a commit, never below 1.
    pub fn amount(self, summary: &CommitSummary) -> f64 {
        let raw = match self {
            Measure::Commits => 1,
            Measure::Lines => summary.lines_changed(),
            Measure::Blocks => summary.blocks_changed,
            Measure::Files => summary.files_changed,
        };
        raw.max(1) as f64
    }

    /// Whether evaluating this measure reads the commit attribute table.
    pub fn reads_table(self) -> bool {
        self != Measure::Commits
    }
}

/// Fixed weight shapes over the window that ignore the commits themselves.
/// Both follow a half circle spanning the window, offset so weights stay >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Heaviest halfway between start and base
    Centre,
    /// Heaviest next to start and base
    Edges,
}

impl Profile {
    fn weight(self, pos: Position, start: Position, base: Position) -> f64 {
        let half = (base - start) as f64 / 2.0;
        let x = (pos - start) as f64;
        let rise = (half * half - (half - x).powi(2)).max(0.0).sqrt();
        match self {
            Profile::Centre => 1.0 + rise,
            Profile::Edges => 1.0 + half - rise,
        }
    }
}

/// How a regression curve's abscissa is derived from a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalisation {
    /// `(pos - start) / (base - start)`
    ByIndex,
    /// `cumulative(pos) / cumulative(base)` over the measured quantity
    ByCumulative,
}

/// Per-position weight of the gap between `pos` and `pos + 1`
#[derive(Debug, Clone, PartialEq)]
pub enum WeightFunction {
    Measured(Measure),
    Regression { measure: Measure, curve: RegFunc },
    Profile(Profile),
}

/// What a weight function may observe of the window being compiled.
#[derive(Debug, Clone, Copy)]
pub struct WindowView<'a> {
    pub start: Position,
    pub base: Position,
    pub table: &'a [CommitSummary],
    /// Inclusive running total of the measured quantity from `start`; only
    /// populated for [`Normalisation::ByCumulative`].
    pub cumulative: &'a [f64],
}

/// Coerces anything below 1 (NaN included) up to 1.
pub fn floor_weight(y: f64) -> f64 {
    if y >= 1.0 {
        y
    } else {
        1.0
    }
}

impl WeightFunction {
    /// Every commit weighs 1: plain binary search.
    pub fn constant() -> Self {
        WeightFunction::Measured(Measure::Commits)
    }

    pub fn new(measure: Measure, curve: Option<RegFunc>) -> Self {
        match curve {
            Some(curve) => WeightFunction::Regression { measure, curve },
            None => WeightFunction::Measured(measure),
        }
    }

    pub fn measure(&self) -> Measure {
        match self {
            WeightFunction::Measured(measure) => *measure,
            WeightFunction::Regression { measure, .. } => *measure,
            WeightFunction::Profile(_) => Measure::Commits,
        }
    }

    pub fn reads_table(&self) -> bool {
        self.measure().reads_table()
    }

    pub fn normalisation(&self) -> Option<Normalisation> {
        match self {
            WeightFunction::Measured(_) => None,
            WeightFunction::Regression { measure: Measure::Commits, .. } | WeightFunction::Profile(_) => {
                Some(Normalisation::ByIndex)
            }
            WeightFunction::Regression { .. } => Some(Normalisation::ByCumulative),
        }
    }

    /// Whether the curve is sampled at `x = 0` for each window start while
    /// being undefined there. Cumulative normalisation never yields 0.
    pub fn evaluates_undefined_zero(&self) -> bool {
        match self {
            WeightFunction::Regression { curve, .. } => {
                self.normalisation() == Some(Normalisation::ByIndex) && curve.skip_zero()
            }
            _ => false,
        }
    }

    /// Fills `out` with the inclusive running total of the measured quantity
    /// over `[start, base]`, or leaves it empty when the curve is indexed by
    /// position.
    pub fn compile_cumulative(&self, table: &[CommitSummary], start: Position, base: Position, out: &mut Vec<f64>) {
        out.clear();
        if self.normalisation() != Some(Normalisation::ByCumulative) {
            return;
        }
        let measure = self.measure();
        let mut total = 0.0;
        out.extend(table[start..=base].iter().map(|summary| {
            total += measure.amount(summary);
            total
        }));
    }

    pub fn weight(&self, pos: Position, window: &WindowView<'_>) -> f64 {
        match self {
            WeightFunction::Measured(Measure::Commits) => 1.0,
            WeightFunction::Measured(measure) => measure.amount(&window.table[pos]),
            WeightFunction::Regression { measure: Measure::Commits, curve } => {
                let x = (pos - window.start) as f64 / (window.base - window.start) as f64;
                floor_weight(curve.apply(x))
            }
            WeightFunction::Regression { curve, .. } => {
                let offset = window.base - window.start;
                let x = window.cumulative[pos - window.start] / window.cumulative[offset];
                floor_weight(curve.apply(x))
            }
            WeightFunction::Profile(profile) => profile.weight(pos, window.start, window.base),
        }
    }
}
