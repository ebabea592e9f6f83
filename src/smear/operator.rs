//! Forward slit-smearing operator.
//!
//! ```text
//! S(q) = 2 ∫_0^{l₀} P_l(x) C(sqrt(q² + x²)) dx
//! ```
//!
//! The integration grid reuses the data spacing: `x[k] = l₀ (q[k] - q[0]) / (q[last] - q[0])`.
//! Each output sample is independent, so samples are evaluated in parallel
//! (rayon); every sample keeps its own bracket cursor and sums in the same
//! order as a serial pass would.

use log::{debug, warn};
use rayon::prelude::*;

use crate::domain::{DesmearParams, TailWeighting};
use crate::error::DesmearError;
use crate::extrap::{self, Extrapolation};
use crate::math::trapezoid;
use crate::smear::{BracketCursor, lookup, lookup_blended, plengt, tail_window};

/// The subset of [`DesmearParams`] one smearing pass needs.
#[derive(Debug, Clone, Copy)]
pub struct SmearSettings<'a> {
    pub extrapolation: &'a str,
    pub s_final: f64,
    pub slit_length: f64,
    pub weighted_transition: bool,
    pub tail_weighting: TailWeighting,
}

impl<'a> From<&'a DesmearParams> for SmearSettings<'a> {
    fn from(p: &'a DesmearParams) -> Self {
        Self {
            extrapolation: p.extrapolation(),
            s_final: p.s_final(),
            slit_length: p.slit_length(),
            weighted_transition: p.weighted_transition(),
            tail_weighting: p.tail_weighting(),
        }
    }
}

/// Fit the named extrapolation to the tail of `C ± dC`.
///
/// The tail is `q ≥ s_final`, excluding the last sample; it must hold at
/// least two points.
pub fn prepare_extrapolation(
    q: &[f64],
    c: &[f64],
    dc: &[f64],
    name: &str,
    s_final: f64,
    weighting: TailWeighting,
) -> Result<Box<dyn Extrapolation>, DesmearError> {
    let (q_min, q_max) = match (q.first(), q.last()) {
        (Some(&a), Some(&b)) => (a, b),
        _ => {
            return Err(DesmearError::InsufficientData {
                context: "smearing",
                needed: 2,
                found: 0,
            });
        }
    };
    if s_final >= q_max {
        return Err(DesmearError::SFinalOutOfRange { s_final, q_min, q_max });
    }
    let window = tail_window(q, s_final);
    if window.len() < 2 {
        return Err(DesmearError::InsufficientData {
            context: "the extrapolation fit above sFinal",
            needed: 2,
            found: window.len(),
        });
    }

    let mut extrapolation = extrap::create_with(name, weighting)?;
    extrapolation.fit(&q[window.clone()], &c[window.clone()], &dc[window.clone()])?;
    debug!(
        "extrapolation fitted on {} points (q {}..{}): {extrapolation}",
        window.len(),
        q[window.start],
        q[window.end - 1]
    );
    Ok(extrapolation)
}

/// Smear the candidate curve `C ± dC`.
///
/// Returns the smeared curve and the extrapolation fitted for this pass. Every
/// failure is reported as [`DesmearError::Smearing`] with its cause attached.
pub fn smear(
    q: &[f64],
    c: &[f64],
    dc: &[f64],
    settings: &SmearSettings<'_>,
) -> Result<(Vec<f64>, Box<dyn Extrapolation>), DesmearError> {
    smear_inner(q, c, dc, settings).map_err(DesmearError::smearing)
}

fn smear_inner(
    q: &[f64],
    c: &[f64],
    dc: &[f64],
    settings: &SmearSettings<'_>,
) -> Result<(Vec<f64>, Box<dyn Extrapolation>), DesmearError> {
    let n = q.len();
    if c.len() != n || dc.len() != n {
        return Err(DesmearError::InvalidInput(format!(
            "smearing columns differ in length: q={n}, C={}, dC={}",
            c.len(),
            dc.len()
        )));
    }
    if n < 2 {
        return Err(DesmearError::InsufficientData {
            context: "smearing",
            needed: 2,
            found: n,
        });
    }
    let l0 = settings.slit_length;
    if !(l0.is_finite() && l0 > 0.0) {
        return Err(DesmearError::InvalidInput(format!(
            "slit length must be finite and > 0 (got {l0})"
        )));
    }

    let extrapolation = prepare_extrapolation(
        q,
        c,
        dc,
        settings.extrapolation,
        settings.s_final,
        settings.tail_weighting,
    )?;

    let non_positive = c.iter().filter(|&&v| v <= 0.0).count();
    if non_positive > 0 {
        warn!("{non_positive} non-positive values in C: log interpolation falls back to linear near them");
    }

    let q0 = q[0];
    let q_range = q[n - 1] - q0;
    let x: Vec<f64> = q.iter().map(|&qi| l0 * (qi - q0) / q_range).collect();
    let w: Vec<f64> = x.iter().map(|&xi| plengt(xi, l0)).collect();
    let ex = extrapolation.as_ref();

    let smeared = q
        .par_iter()
        .map(|&q_now| -> Result<f64, DesmearError> {
            let mut cursor = BracketCursor::new();
            let mut integrand = Vec::with_capacity(n);
            for (&xk, &wk) in x.iter().zip(&w) {
                let u = (q_now * q_now + xk * xk).sqrt();
                let value = if settings.weighted_transition {
                    lookup_blended(u, q, c, ex, settings.s_final, &mut cursor)?
                } else {
                    lookup(u, q, c, ex, &mut cursor)?
                };
                integrand.push(wk * value);
            }
            // Doubled: the slit window is symmetric about x = 0.
            Ok(2.0 * trapezoid(&x, &integrand))
        })
        .collect::<Result<Vec<f64>, _>>()?;

    Ok((smeared, extrapolation))
}
