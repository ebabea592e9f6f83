//! Running-sum ("statistics register") linear regression.
//!
//! Extrapolation fits accumulate a handful of sums over the tail points and
//! then solve the 2×2 normal equations
//!
//! ```text
//! | Σw   Σwx  | |a|   | Σwy  |
//! | Σwx  Σwx² | |b| = | Σwxy |
//! ```
//!
//! for `y = a + b·x`. With unit weights this is ordinary least squares.

use nalgebra::{Matrix2, Vector2};

use crate::error::DesmearError;

/// Accumulated sums for a (possibly weighted) straight-line fit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsRegisters {
    count: usize,
    sum_w: f64,
    sum_wx: f64,
    sum_wy: f64,
    sum_wxx: f64,
    sum_wxy: f64,
}

impl StatsRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one point with unit weight.
    pub fn add(&mut self, x: f64, y: f64) {
        self.add_weighted(x, y, 1.0);
    }

    /// Add one point with weight `w` (typically `1/σ²`).
    pub fn add_weighted(&mut self, x: f64, y: f64, w: f64) {
        self.count += 1;
        self.sum_w += w;
        self.sum_wx += w * x;
        self.sum_wy += w * y;
        self.sum_wxx += w * x * x;
        self.sum_wxy += w * x * y;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Weighted mean of `y`.
    pub fn mean(&self) -> Result<f64, DesmearError> {
        if self.count == 0 || self.sum_w <= 0.0 {
            return Err(DesmearError::InsufficientData {
                context: "a mean",
                needed: 1,
                found: self.count,
            });
        }
        Ok(self.sum_wy / self.sum_w)
    }

    /// Solve for `(intercept, slope)` of `y = intercept + slope·x`.
    pub fn linear_regression(&self) -> Result<(f64, f64), DesmearError> {
        if self.count < 2 {
            return Err(DesmearError::InsufficientData {
                context: "a linear regression",
                needed: 2,
                found: self.count,
            });
        }
        let normal = Matrix2::new(self.sum_w, self.sum_wx, self.sum_wx, self.sum_wxx);
        let rhs = Vector2::new(self.sum_wy, self.sum_wxy);

        let solution = normal
            .lu()
            .solve(&rhs)
            .filter(|v| v.iter().all(|c| c.is_finite()))
            .ok_or_else(|| {
                DesmearError::InvalidInput(format!(
                    "linear regression is singular ({} points share one abscissa)",
                    self.count
                ))
            })?;
        Ok((solution[0], solution[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn regression_recovers_exact_line() {
        let mut reg = StatsRegisters::new();
        for x in [0.0, 1.0, 2.0, 5.0] {
            reg.add(x, 2.0 + 3.0 * x);
        }
        let (a, b) = reg.linear_regression().unwrap();
        assert_relative_eq!(a, 2.0, epsilon = 1e-12);
        assert_relative_eq!(b, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn weights_pull_the_fit_toward_heavy_points() {
        // Two points on y=x, one outlier with negligible weight.
        let mut reg = StatsRegisters::new();
        reg.add_weighted(0.0, 0.0, 1.0);
        reg.add_weighted(1.0, 1.0, 1.0);
        reg.add_weighted(2.0, 100.0, 1e-12);
        let (a, b) = reg.linear_regression().unwrap();
        assert_relative_eq!(a, 0.0, epsilon = 1e-6);
        assert_relative_eq!(b, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn mean_and_degenerate_cases() {
        let mut reg = StatsRegisters::new();
        assert!(reg.mean().is_err());
        reg.add(1.0, 4.0);
        assert!(matches!(
            reg.linear_regression(),
            Err(DesmearError::InsufficientData { found: 1, .. })
        ));
        reg.add(1.0, 6.0);
        assert_relative_eq!(reg.mean().unwrap(), 5.0);
        assert!(reg.linear_regression().is_err());
    }
}
