// src/regfunc.rs

//! Evaluation of fitted regression curves over a normalised abscissa.
//!
//! Coefficients come from an external fitting process; this module only
//! evaluates curves, renders them, and measures how well they match samples.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Curve family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// `sum(a_j * x^(j - offset))`
    #[value(name = "poly")]
    Polynomial,
    /// `e^(polynomial)`
    #[value(name = "exp")]
    ExpPolynomial,
    /// `1 / polynomial`
    #[value(name = "recip")]
    Reciprocal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegFunc {
    kind: CurveKind,
    /// Order of the fitted polynomial, as recorded by the fit
    degree: usize,
    #[serde(default)]
    negative_power_offset: i32,
    coefficients: Vec<f64>,
}

fn order(coefficients: &[f64]) -> usize {
    coefficients.len().saturating_sub(1)
}

impl RegFunc {
    /// Polynomial whose coefficient `j` multiplies `x^(j - negative_power_offset)`.
    pub fn polynomial(coefficients: Vec<f64>, negative_power_offset: i32) -> Self {
        Self {
            kind: CurveKind::Polynomial,
            degree: order(&coefficients),
            negative_power_offset,
            coefficients,
        }
    }

    pub fn exp_polynomial(coefficients: Vec<f64>) -> Self {
        Self {
            kind: CurveKind::ExpPolynomial,
            degree: order(&coefficients),
            negative_power_offset: 0,
            coefficients,
        }
    }

    pub fn reciprocal(coefficients: Vec<f64>) -> Self {
        Self {
            kind: CurveKind::Reciprocal,
            degree: order(&coefficients),
            negative_power_offset: 0,
            coefficients,
        }
    }

    pub fn new(kind: CurveKind, coefficients: Vec<f64>, negative_power_offset: i32) -> Self {
        match kind {
            CurveKind::Polynomial => Self::polynomial(coefficients, negative_power_offset),
            CurveKind::ExpPolynomial => Self::exp_polynomial(coefficients),
            CurveKind::Reciprocal => Self::reciprocal(coefficients),
        }
    }

    /// Checks a descriptor that did not come through one of the constructors.
    ///
    /// The degree may be given as the polynomial order (one less than the
    /// coefficient count) or as the coefficient count itself.
    pub fn validate(self) -> Result<Self> {
        if self.coefficients.is_empty() {
            return Err(Error::EmptyCurve);
        }
        let len = self.coefficients.len();
        if self.degree != len - 1 && self.degree != len {
            return Err(Error::DegreeMismatch {
                degree: self.degree,
                coefficients: self.coefficients.len(),
            });
        }
        Ok(self)
    }

    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn negative_power_offset(&self) -> i32 {
        self.negative_power_offset
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn exponent(&self, j: usize) -> i32 {
        j as i32 - self.negative_power_offset
    }

    fn polynomial_at(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .enumerate()
            .map(|(j, a)| a * x.powi(self.exponent(j)))
            .sum()
    }

    /// Evaluates the curve at `x`. Reciprocal curves must not be sampled at 0.
    pub fn apply(&self, x: f64) -> f64 {
        let y = self.polynomial_at(x);
        match self.kind {
            CurveKind::Polynomial => y,
            CurveKind::ExpPolynomial => y.exp(),
            CurveKind::Reciprocal => 1.0 / y,
        }
    }

    pub fn apply_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.apply(x)).collect()
    }

    /// Whether `x = 0` must be left out of the sampling domain: reciprocal
    /// curves and curves with a negative power are infinite there.
    pub fn skip_zero(&self) -> bool {
        self.kind == CurveKind::Reciprocal || self.negative_power_offset > 0
    }

    /// `n` evenly spaced points over the unit interval, starting at `1/n`
    /// instead of 0 when the curve cannot be sampled at 0.
    pub fn sample_domain(&self, n: usize) -> Vec<f64> {
        if n == 0 {
            return Vec::new();
        }
        if self.skip_zero() {
            (1..=n).map(|i| i as f64 / n as f64).collect()
        } else if n == 1 {
            vec![0.0]
        } else {
            (0..n).map(|i| i as f64 / (n - 1) as f64).collect()
        }
    }

    /// Sum of squared residuals.
    pub fn error(&self, xs: &[f64], ys: &[f64]) -> f64 {
        xs.iter()
            .zip(ys)
            .map(|(&x, &y)| (y - self.apply(x)).powi(2))
            .sum()
    }

    pub fn mean_absolute_error(&self, xs: &[f64], ys: &[f64]) -> f64 {
        let total: f64 = xs.iter().zip(ys).map(|(&x, &y)| (y - self.apply(x)).abs()).sum();
        total / xs.len() as f64
    }

    pub fn mean_square_error(&self, xs: &[f64], ys: &[f64]) -> f64 {
        self.error(xs, ys) / xs.len() as f64
    }

    pub fn root_mean_square_error(&self, xs: &[f64], ys: &[f64]) -> f64 {
        self.mean_square_error(xs, ys).sqrt()
    }

    /// In percent. Samples with `y = 0` make this infinite.
    pub fn mean_absolute_percentage_error(&self, xs: &[f64], ys: &[f64]) -> f64 {
        let total: f64 = xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| ((y - self.apply(x)) / y).abs())
            .sum();
        100.0 * total / xs.len() as f64
    }

    pub fn mean_percentage_error(&self, xs: &[f64], ys: &[f64]) -> f64 {
        let total: f64 = xs.iter().zip(ys).map(|(&x, &y)| (y - self.apply(x)) / y).sum();
        100.0 * total / xs.len() as f64
    }

    /// R^2
    pub fn coefficient_of_determination(&self, xs: &[f64], ys: &[f64]) -> f64 {
        let n = ys.len() as f64;
        let mean = ys.iter().sum::<f64>() / n;
        let total_sum_squares: f64 = ys.iter().map(|y| (y - mean).powi(2)).sum();
        1.0 - self.mean_square_error(xs, ys) / (total_sum_squares / n)
    }
}

impl fmt::Display for RegFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut body = String::new();
        for (rank, j) in (0..self.coefficients.len()).rev().enumerate() {
            let value = self.coefficients[j];
            if rank == 0 {
                if value < 0.0 {
                    body.push('-');
                }
            } else if value < 0.0 {
                body.push_str(" - ");
            } else {
                body.push_str(" + ");
            }
            match self.exponent(j) {
                0 => body.push_str(&format!("{:.3}", value.abs())),
                1 => body.push_str(&format!("{:.3}x", value.abs())),
                power => body.push_str(&format!("{:.3}x^{{{}}}", value.abs(), power)),
            }
        }

        match self.kind {
            CurveKind::Polynomial => write!(f, "{body}"),
            CurveKind::ExpPolynomial => write!(f, "e^{{{body}}}"),
            CurveKind::Reciprocal => write!(f, "({body})^{{-1}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_polynomial_at_half() {
        let curve = RegFunc::polynomial(vec![0.0, 1.0], 0);
        assert_eq!(curve.degree(), 1);
        assert!((curve.apply(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_exp_polynomial_at_half() {
        let curve = RegFunc::exp_polynomial(vec![0.0, 1.0]);
        assert!((curve.apply(0.5) - 0.5f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn test_reciprocal() {
        let curve = RegFunc::reciprocal(vec![1.0, 3.0]);
        assert!((curve.apply(1.0) - 0.25).abs() < 1e-12);
        assert!(curve.skip_zero());
        assert_eq!(curve.sample_domain(4), vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_negative_power_offset() {
        // 2/x - 1 + 3x
        let curve = RegFunc::polynomial(vec![2.0, -1.0, 3.0], 1);
        assert!((curve.apply(0.5) - (4.0 - 1.0 + 1.5)).abs() < 1e-12);
        assert!(curve.skip_zero());
        assert_eq!(curve.apply(0.0), f64::INFINITY);
        assert_eq!(curve.sample_domain(2), vec![0.5, 1.0]);
    }

    #[test]
    fn test_sample_domain_includes_zero_when_allowed() {
        let curve = RegFunc::polynomial(vec![1.0], 0);
        assert_eq!(curve.sample_domain(3), vec![0.0, 0.5, 1.0]);
        assert!(curve.sample_domain(0).is_empty());
    }

    #[test]
    fn test_display() {
        let curve = RegFunc::polynomial(vec![0.5, -2.0, 1.0], 0);
        assert_eq!(curve.to_string(), "1.000x^{2} - 2.000x + 0.500");

        let curve = RegFunc::exp_polynomial(vec![1.0, -3.0]);
        assert_eq!(curve.to_string(), "e^{-3.000x + 1.000}");

        let curve = RegFunc::reciprocal(vec![2.0]);
        assert_eq!(curve.to_string(), "(2.000)^{-1}");

        let curve = RegFunc::polynomial(vec![4.0, 1.0], 1);
        assert_eq!(curve.to_string(), "1.000 + 4.000x^{-1}");
    }

    #[test]
    fn test_fit_measures_on_exact_curve() {
        let curve = RegFunc::polynomial(vec![1.0, 2.0], 0);
        let xs = [0.0, 0.5, 1.0];
        let ys = curve.apply_all(&xs);
        assert_eq!(curve.error(&xs, &ys), 0.0);
        assert_eq!(curve.mean_absolute_error(&xs, &ys), 0.0);
        assert_eq!(curve.root_mean_square_error(&xs, &ys), 0.0);
        assert_eq!(curve.mean_percentage_error(&xs, &ys), 0.0);
        assert!((curve.coefficient_of_determination(&xs, &ys) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_measures_on_offset_curve() {
        let curve = RegFunc::polynomial(vec![1.0], 0);
        let xs = [0.0, 1.0];
        let ys = [2.0, 4.0];
        assert!((curve.error(&xs, &ys) - 10.0).abs() < 1e-12);
        assert!((curve.mean_absolute_error(&xs, &ys) - 2.0).abs() < 1e-12);
        assert!((curve.mean_square_error(&xs, &ys) - 5.0).abs() < 1e-12);
        // (1/2 + 3/4) / 2 * 100
        assert!((curve.mean_absolute_percentage_error(&xs, &ys) - 62.5).abs() < 1e-9);
    }

    #[test]
    fn test_validate_descriptor() {
        let json = r#"{"kind": "exp_polynomial", "degree": 3, "coefficients": [1.0, 2.0]}"#;
        let curve: RegFunc = serde_json::from_str(json).unwrap();
        assert!(matches!(
            curve.validate(),
            Err(Error::DegreeMismatch { degree: 3, coefficients: 2 })
        ));

        let json = r#"{"kind": "reciprocal", "degree": 0, "coefficients": []}"#;
        let curve: RegFunc = serde_json::from_str(json).unwrap();
        assert!(matches!(curve.validate(), Err(Error::EmptyCurve)));

        let json = r#"{"kind": "polynomial", "degree": 2, "negative_power_offset": 1, "coefficients": [1.0, 2.0]}"#;
        let curve = serde_json::from_str::<RegFunc>(json).unwrap().validate().unwrap();
        assert_eq!(curve.negative_power_offset(), 1);
    }

    #[test]
    fn test_degree_is_polynomial_order() {
        let json = r#"{"kind": "polynomial", "degree": 1, "negative_power_offset": 0, "coefficients": [0.0, 1.0]}"#;
        let curve = serde_json::from_str::<RegFunc>(json).unwrap().validate().unwrap();
        assert_eq!(curve.degree(), 1);
        assert!((curve.apply(0.5) - 0.5).abs() < 1e-12);

        assert_eq!(RegFunc::reciprocal(vec![2.0]).degree(), 0);
        assert_eq!(RegFunc::exp_polynomial(vec![1.0, 0.0, 0.0]).degree(), 2);
    }
}
