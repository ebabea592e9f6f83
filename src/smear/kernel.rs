//! Slit-length weighting function `P_l(x)`.

/// Rectangular slit of half-length `slit_length`: `1/(2·l₀)` for `|x| ≤ l₀`, else zero.
///
/// Integrates to 1 over the real line. The smearing integral always runs over
/// `[0, l₀]`, so a different kernel shape can be dropped in here without
/// touching the operator.
pub fn plengt(x: f64, slit_length: f64) -> f64 {
    if x.abs() > slit_length {
        0.0
    } else {
        0.5 / slit_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::trapezoid;
    use approx::assert_relative_eq;

    #[test]
    fn value_at_origin_and_outside_window() {
        let l = 0.08;
        assert_eq!(plengt(0.0, l), 1.0 / (2.0 * l));
        assert_eq!(plengt(l, l), 1.0 / (2.0 * l));
        assert_eq!(plengt(-l, l), 1.0 / (2.0 * l));
        assert_eq!(plengt(l * 1.0001, l), 0.0);
        assert_eq!(plengt(-1.0, l), 0.0);
    }

    #[test]
    fn integrates_to_one_over_window() {
        let l = 0.08;
        let n = 401;
        let x: Vec<f64> = (0..n)
            .map(|i| -l + 2.0 * l * i as f64 / (n - 1) as f64)
            .collect();
        let w: Vec<f64> = x.iter().map(|&v| plengt(v, l)).collect();
        assert_relative_eq!(trapezoid(&x, &w), 1.0, max_relative = 1e-9);
    }
}
