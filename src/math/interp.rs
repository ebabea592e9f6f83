//! Interpolation and quadrature primitives.

/// Straight-line interpolation of `y(x)` through `(x1, y1)` and `(x2, y2)`.
///
/// Degenerate brackets (`x1 == x2`) return `y1`.
pub fn linear_interpolation(x: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if x2 == x1 {
        return y1;
    }
    y1 + (y2 - y1) * (x - x1) / (x2 - x1)
}

/// Interpolate linearly in `ln(y)`; `None` if either endpoint is not strictly positive.
pub fn log_interpolation(x: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Option<f64> {
    if y1 <= 0.0 || y2 <= 0.0 {
        return None;
    }
    Some(linear_interpolation(x, x1, y1.ln(), x2, y2.ln()).exp())
}

/// Trapezoid-rule integral of sampled `y(x)`. Fewer than two samples integrate to zero.
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_interpolation_hits_endpoints_and_midpoint() {
        assert_eq!(linear_interpolation(1.0, 1.0, 10.0, 3.0, 30.0), 10.0);
        assert_eq!(linear_interpolation(3.0, 1.0, 10.0, 3.0, 30.0), 30.0);
        assert_relative_eq!(linear_interpolation(2.0, 1.0, 10.0, 3.0, 30.0), 20.0);
    }

    #[test]
    fn log_interpolation_is_geometric_and_rejects_non_positive() {
        let mid = log_interpolation(2.0, 1.0, 10.0, 3.0, 1000.0).unwrap();
        assert_relative_eq!(mid, 100.0, max_relative = 1e-12);
        assert!(log_interpolation(2.0, 1.0, 0.0, 3.0, 1.0).is_none());
        assert!(log_interpolation(2.0, 1.0, 1.0, 3.0, -1.0).is_none());
    }

    #[test]
    fn trapezoid_is_exact_for_straight_lines() {
        let x: Vec<f64> = (0..=10).map(|i| i as f64 * 0.3).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 + 0.5 * v).collect();
        // ∫_0^3 (2 + x/2) dx = 6 + 2.25
        assert_relative_eq!(trapezoid(&x, &y), 8.25, max_relative = 1e-12);
        assert_eq!(trapezoid(&[1.0], &[5.0]), 0.0);
    }
}
