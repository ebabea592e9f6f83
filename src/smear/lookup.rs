//! Intensity lookup at arbitrary `u`: exact sample, log-linear interpolation,
//! or extrapolation past the data.

use crate::error::DesmearError;
use crate::extrap::Extrapolation;
use crate::math::{linear_interpolation, log_interpolation};

/// Where a target abscissa falls relative to the sampled `q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    /// `u < q[0]`
    Below,
    /// `u == q[i]`
    Exact(usize),
    /// `q[i] < u < q[i+1]`
    Between(usize),
    /// `u > q[last]`
    Above,
}

/// Last bracket found, used as a starting guess for the next search.
///
/// The smearing integrand walks `u` upward through the data, so the next
/// bracket is usually the same one or the one after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketCursor {
    lo: usize,
}

impl BracketCursor {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Find the bracket of `u` in ascending `q`.
pub fn locate(q: &[f64], u: f64, cursor: &mut BracketCursor) -> Bracket {
    let n = q.len();
    if n == 0 || u < q[0] || u.is_nan() {
        return Bracket::Below;
    }
    let last = n - 1;
    if u > q[last] {
        return Bracket::Above;
    }
    if u == q[last] {
        cursor.lo = last;
        return Bracket::Exact(last);
    }

    // Invariant sought: q[lo] <= u < q[lo + 1]
    let fits = |lo: usize| lo < last && q[lo] <= u && u < q[lo + 1];
    let lo = if fits(cursor.lo) {
        cursor.lo
    } else if fits(cursor.lo + 1) {
        cursor.lo + 1
    } else {
        q.partition_point(|&v| v <= u) - 1
    };
    cursor.lo = lo;

    if q[lo] == u {
        Bracket::Exact(lo)
    } else {
        Bracket::Between(lo)
    }
}

/// Value between two samples: log-linear, or plain linear when either
/// neighbour is not strictly positive.
pub fn interpolate(q: &[f64], curve: &[f64], lo: usize, u: f64) -> f64 {
    let (q1, y1, q2, y2) = (q[lo], curve[lo], q[lo + 1], curve[lo + 1]);
    log_interpolation(u, q1, y1, q2, y2).unwrap_or_else(|| linear_interpolation(u, q1, y1, q2, y2))
}

/// Estimate `curve(u)`.
///
/// - exact sample: that sample's value
/// - inside the data: [`interpolate`]
/// - past `q[last]`: `extrap.evaluate(u)`
/// - below `q[0]`: [`DesmearError::LookupBelowRange`]
pub fn lookup(
    u: f64,
    q: &[f64],
    curve: &[f64],
    extrap: &dyn Extrapolation,
    cursor: &mut BracketCursor,
) -> Result<f64, DesmearError> {
    match locate(q, u, cursor) {
        Bracket::Below => Err(DesmearError::LookupBelowRange {
            u,
            q_min: q.first().copied().unwrap_or(f64::NAN),
        }),
        Bracket::Exact(i) => Ok(curve[i]),
        Bracket::Between(lo) => Ok(interpolate(q, curve, lo, u)),
        Bracket::Above => Ok(extrap.evaluate(u)),
    }
}

/// [`lookup`] with a linear hand-over from interpolation to extrapolation
/// across `(s_final, q[last]]`.
///
/// Blend weight `f = (u - s_final) / (q[last] - s_final)` runs from 0 at
/// `s_final` to 1 at `q[last]`: `(1 - f)·interpolated + f·extrapolated`.
pub fn lookup_blended(
    u: f64,
    q: &[f64],
    curve: &[f64],
    extrap: &dyn Extrapolation,
    s_final: f64,
    cursor: &mut BracketCursor,
) -> Result<f64, DesmearError> {
    let inside = lookup(u, q, curve, extrap, cursor)?;
    let q_last = q[q.len() - 1];
    if u <= s_final || u > q_last || q_last <= s_final {
        return Ok(inside);
    }
    let f = (u - s_final) / (q_last - s_final);
    Ok((1.0 - f) * inside + f * extrap.evaluate(u))
}
