//! Uncertainty estimate for the desmeared curve.
//!
//! Two contributions, summed per point:
//!
//! - the input relative error carried over: `|C·dI/I|`
//! - the scatter of `C` about a straight line through the point and its two
//!   neighbours
//!
//! The sum is then smoothed (five passes of a distance-weighted 3-point
//! average, endpoints fixed) to lift grossly under-estimated points.

use crate::math::StatsRegisters;

const SMOOTHING_PASSES: usize = 5;

/// Estimate `dC` from the measured `I ± dI` and the current `C`.
///
/// With fewer than three samples only the proportional term is returned.
pub fn propagate_uncertainty(q: &[f64], intensity: &[f64], di: &[f64], c: &[f64]) -> Vec<f64> {
    let n = q.len();
    let mut dz: Vec<f64> = (0..n)
        .map(|i| {
            if intensity[i] == 0.0 {
                di[i]
            } else {
                (c[i] * di[i] / intensity[i]).abs()
            }
        })
        .collect();
    if n < 3 {
        return dz;
    }

    // Line through (i-1, i, i+1); the end points use the nearest full triple.
    let scatter = |centre: usize, at: usize| -> f64 {
        let mut reg = StatsRegisters::new();
        for j in centre - 1..=centre + 1 {
            reg.add(q[j], c[j]);
        }
        match reg.linear_regression() {
            Ok((a, b)) => (a + b * q[at] - c[at]).abs(),
            Err(_) => 0.0,
        }
    };
    dz[0] += scatter(1, 0);
    for i in 1..n - 1 {
        dz[i] += scatter(i, i);
    }
    dz[n - 1] += scatter(n - 2, n - 1);

    for _ in 0..SMOOTHING_PASSES {
        dz = smoothing_pass(q, &dz);
    }
    dz
}

/// One pass of the distance-weighted 3-point average.
///
/// Every interior point is computed from the previous pass; the end points
/// are copied through. Needs at least three samples.
fn smoothing_pass(q: &[f64], y: &[f64]) -> Vec<f64> {
    let n = y.len();
    let mut out = y.to_vec();
    for i in 1..n - 1 {
        let w1 = (1.0 - (1.0 - q[i - 1] / q[i]).abs()).powi(2);
        let w2 = (1.0 - (1.0 - q[i + 1] / q[i]).abs()).powi(2);
        out[i] = (w1 * y[i - 1] + y[i] + w2 * y[i + 1]) / (w1 + 1.0 + w2);
    }
    out
}
