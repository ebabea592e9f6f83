//! Extrapolation of SAS data past the measured q range.
//!
//! The slit-smearing integral evaluates `I(sqrt(q² + x²))` up to
//! `sqrt(q_last² + l₀²)`, beyond the last measured point. An extrapolation
//! form is fitted to the tail of the current candidate curve and supplies
//! those values.
//!
//! Every form:
//!
//! - accumulates regression sums over the tail in its own transformed coordinates
//! - solves for its named coefficients
//! - evaluates at arbitrary `q`
//!
//! Forms are looked up by name in a static registry (see [`create`]). Adding a
//! form means implementing [`Extrapolation`] and adding one registry entry.

pub mod constant;
pub mod linear;
pub mod porod;
pub mod powerlaw;

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{ExtrapolationSummary, TailWeighting};
use crate::error::DesmearError;
use crate::math::StatsRegisters;

pub use constant::Constant;
pub use linear::Linear;
pub use porod::Porod;
pub use powerlaw::PowerLaw;

/// A parametric model of `I(q)` beyond the measured data.
pub trait Extrapolation: fmt::Display + fmt::Debug + Send + Sync {
    /// Registry key.
    fn name(&self) -> &'static str;

    /// Functional form with symbolic coefficients, e.g. `I(q) = B + m*q`.
    fn formula(&self) -> &'static str;

    /// Fit the coefficients to `(q, y ± dy)`. Needs at least two points.
    fn fit(&mut self, q: &[f64], y: &[f64], dy: &[f64]) -> Result<(), DesmearError>;

    fn evaluate(&self, q: f64) -> f64;

    fn evaluate_many(&self, q: &[f64]) -> Vec<f64> {
        q.iter().map(|&v| self.evaluate(v)).collect()
    }

    fn coefficients(&self) -> BTreeMap<String, f64>;

    fn summary(&self) -> ExtrapolationSummary {
        ExtrapolationSummary {
            name: self.name().to_string(),
            formula: self.formula().to_string(),
            coefficients: self.coefficients(),
        }
    }
}

type Factory = fn(TailWeighting) -> Box<dyn Extrapolation>;

/// Registered forms, in presentation order.
static REGISTRY: &[(&str, Factory)] = &[
    (constant::NAME, |w| Box::new(Constant::new(w))),
    (linear::NAME, |w| Box::new(Linear::new(w))),
    (powerlaw::NAME, |w| Box::new(PowerLaw::new(w))),
    (porod::NAME, |w| Box::new(Porod::new(w))),
];

/// Names of all registered forms.
pub fn available() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

/// Resolve `name` (case-insensitive) to its registry key.
pub fn canonical_name(name: &str) -> Result<&'static str, DesmearError> {
    find(name).map(|(key, _)| key)
}

/// New, unfitted, unweighted instance of the named form.
pub fn create(name: &str) -> Result<Box<dyn Extrapolation>, DesmearError> {
    create_with(name, TailWeighting::Unweighted)
}

/// New, unfitted instance of the named form with the given fit weighting.
pub fn create_with(name: &str, weighting: TailWeighting) -> Result<Box<dyn Extrapolation>, DesmearError> {
    find(name).map(|(_, factory)| factory(weighting))
}

fn find(name: &str) -> Result<(&'static str, Factory), DesmearError> {
    let wanted = name.trim();
    REGISTRY
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
        .copied()
        .ok_or_else(|| DesmearError::UnknownExtrapolation {
            name: wanted.to_string(),
            known: available().join(", "),
        })
}

/// One tail point after a form's coordinate transform: regress `y` on `x`,
/// with `sigma` the uncertainty of the transformed `y`.
pub(crate) struct Transformed {
    pub x: f64,
    pub y: f64,
    pub sigma: f64,
}

/// Fill statistics registers with transformed tail points.
///
/// Shared by every form: checks the column lengths and the two-point minimum,
/// then applies the form's transform and the requested weighting.
pub(crate) fn accumulate<F>(
    q: &[f64],
    y: &[f64],
    dy: &[f64],
    weighting: TailWeighting,
    transform: F,
) -> Result<StatsRegisters, DesmearError>
where
    F: Fn(f64, f64, f64) -> Result<Transformed, DesmearError>,
{
    if y.len() != q.len() || dy.len() != q.len() {
        return Err(DesmearError::InvalidInput(format!(
            "extrapolation fit columns differ in length: q={}, y={}, dy={}",
            q.len(),
            y.len(),
            dy.len()
        )));
    }
    if q.len() < 2 {
        return Err(DesmearError::InsufficientData {
            context: "an extrapolation fit",
            needed: 2,
            found: q.len(),
        });
    }

    let mut reg = StatsRegisters::new();
    for ((&qi, &yi), &dyi) in q.iter().zip(y).zip(dy) {
        let t = transform(qi, yi, dyi)?;
        match weighting {
            TailWeighting::Unweighted => reg.add(t.x, t.y),
            TailWeighting::InverseVariance => {
                if !(t.sigma.is_finite() && t.sigma > 0.0) {
                    return Err(DesmearError::InvalidInput(format!(
                        "weighted extrapolation fit needs positive uncertainty at q={qi} (got {})",
                        t.sigma
                    )));
                }
                reg.add_weighted(t.x, t.y, 1.0 / (t.sigma * t.sigma));
            }
        }
    }
    Ok(reg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_all_forms_in_order() {
        assert_eq!(available(), vec!["constant", "linear", "powerlaw", "Porod"]);
    }

    #[test]
    fn lookup_is_case_insensitive_and_rejects_unknown_names() {
        assert_eq!(canonical_name("porod").unwrap(), "Porod");
        assert_eq!(create("LINEAR").unwrap().name(), "linear");

        match create("spline") {
            Err(DesmearError::UnknownExtrapolation { name, known }) => {
                assert_eq!(name, "spline");
                assert!(known.contains("powerlaw"));
            }
            other => panic!("expected UnknownExtrapolation, got {other:?}"),
        }
    }

    #[test]
    fn every_form_needs_two_points() {
        for name in available() {
            let mut f = create(name).unwrap();
            let err = f.fit(&[0.1], &[1.0], &[0.1]).unwrap_err();
            assert!(
                matches!(err, DesmearError::InsufficientData { found: 1, .. }),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn evaluate_many_matches_scalar_evaluate() {
        let mut f = create("linear").unwrap();
        f.fit(&[1.0, 2.0, 3.0], &[3.0, 5.0, 7.0], &[1.0, 1.0, 1.0]).unwrap();
        let qs = [0.5, 4.0, 10.0];
        let many = f.evaluate_many(&qs);
        for (q, v) in qs.iter().zip(many) {
            assert_eq!(v, f.evaluate(*q));
        }
    }

    #[test]
    fn summary_carries_name_formula_and_coefficients() {
        let mut f = create("powerlaw").unwrap();
        f.fit(&[1.0, 2.0], &[3.0, 12.0], &[0.1, 0.1]).unwrap();
        let s = f.summary();
        assert_eq!(s.name, "powerlaw");
        assert_eq!(s.formula, "I(q) = A * q^p");
        assert_eq!(s.coefficients.keys().collect::<Vec<_>>(), vec!["A", "p"]);
    }
}
