// src/distance.rs

//! Cached distance metric.
//!
//! A [`DistanceMetric`] owns one rebuildable window cache. Compiling a window
//! evaluates the weight function once per position and stores prefix sums,
//! after which `weight` and `distance` are constant-time lookups. Compiling
//! the next window overwrites the cache wholesale.

use crate::error::{Error, Result};
use crate::model::{CommitSummary, Position};
use crate::weight::{WeightFunction, WindowView};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct DistanceMetric {
    weights: WeightFunction,
    table: Vec<CommitSummary>,
    /// `(start, base)` of the compiled window
    window: Option<(Position, Position)>,
    /// `cached[i]` is the weight of `start + i`, for `i` in `0..=base-start`
    cached: Vec<f64>,
    /// `prefix[i]` is the total weight of `start..start+i`, so `prefix[0] == 0`
    prefix: Vec<f64>,
    /// Running measured totals for cumulatively normalised curves
    cumulative: Vec<f64>,
}

impl DistanceMetric {
    pub fn new(weights: WeightFunction) -> Self {
        Self {
            weights,
            table: Vec::new(),
            window: None,
            cached: Vec::new(),
            prefix: Vec::new(),
            cumulative: Vec::new(),
        }
    }

    pub fn weight_function(&self) -> &WeightFunction {
        &self.weights
    }

    /// Takes a copy of the full attribute table, indexed by position.
    /// Invalidates any compiled window.
    pub fn compile_global_weights(&mut self, table: &[CommitSummary]) {
        self.table.clear();
        self.table.extend_from_slice(table);
        self.window = None;
    }

    /// Rebuilds the cache for `[start, base]`.
    pub fn compile_range_weights(&mut self, start: Position, base: Position) -> Result<()> {
        self.window = None;
        if start > base {
            return Err(Error::InvalidWindow { start, base });
        }
        if self.weights.reads_table() && base >= self.table.len() {
            return Err(Error::TableTooShort { len: self.table.len(), base });
        }

        self.weights.compile_cumulative(&self.table, start, base, &mut self.cumulative);

        let view = WindowView {
            start,
            base,
            table: &self.table,
            cumulative: &self.cumulative,
        };
        self.cached.clear();
        self.cached.extend((start..=base).map(|pos| self.weights.weight(pos, &view)));

        self.prefix.clear();
        self.prefix.reserve(self.cached.len());
        let mut total = 0.0;
        self.prefix.push(total);
        for w in &self.cached[..self.cached.len() - 1] {
            total += w;
            self.prefix.push(total);
        }

        trace!(start, base, total, "compiled window");
        self.window = Some((start, base));
        Ok(())
    }

    pub fn window(&self) -> Option<(Position, Position)> {
        self.window
    }

    fn index(&self, pos: Position) -> usize {
        match self.window {
            Some((start, base)) if (start..=base).contains(&pos) => pos - start,
            Some((start, base)) => panic!("position {pos} lies outside the compiled window [{start}, {base}]"),
            None => panic!("distance metric queried before any window was compiled"),
        }
    }

    /// Weight of the gap between `pos` and `pos + 1`.
    pub fn weight(&self, pos: Position) -> f64 {
        self.cached[self.index(pos)]
    }

    /// Cumulative weight between two positions, in either order.
    pub fn distance(&self, a: Position, b: Position) -> f64 {
        let (a, b) = if b < a { (b, a) } else { (a, b) };
        self.prefix[self.index(b)] - self.prefix[self.index(a)]
    }

    /// Walks forward from `from` one gap at a time and stops at the first
    /// position where the running weight reaches `offset`, or at the window's
    /// base if the remainder of the window is lighter than `offset`.
    ///
    /// The running total starts at 0 on every call. Prefix differences round
    /// differently once weights are fractional, so they cannot stand in here.
    pub fn walk(&self, from: Position, offset: f64) -> Position {
        let i = self.index(from);
        let mut travelled = 0.0;
        let mut steps = 0;
        for w in &self.cached[i..self.cached.len() - 1] {
            if travelled >= offset {
                break;
            }
            travelled += w;
            steps += 1;
        }
        from + steps
    }
}
