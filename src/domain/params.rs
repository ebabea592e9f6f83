//! Desmearing configuration.

use serde::{Deserialize, Serialize};

use crate::domain::{FeedbackWeighting, IterationBudget, ScatteringCurve, TailWeighting, UncertaintyMode};
use crate::error::DesmearError;
use crate::extrap;

pub const DEFAULT_SLIT_LENGTH: f64 = 0.08;
pub const DEFAULT_S_FINAL: f64 = 0.08;
pub const DEFAULT_EXTRAPOLATION: &str = "linear";
pub const DEFAULT_ITERATIONS: usize = 10;

/// Immutable, validated settings for one desmearing task.
///
/// The progress callback is deliberately not part of this struct; it is an
/// argument of [`crate::desmear::DesmearSession::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesmearParams {
    slit_length: f64,
    s_final: f64,
    extrapolation: String,
    weighting: FeedbackWeighting,
    budget: IterationBudget,
    weighted_transition: bool,
    uncertainty: UncertaintyMode,
    tail_weighting: TailWeighting,
}

impl DesmearParams {
    /// Validates the slit length and resolves `extrapolation` against the
    /// registry (case-insensitive; the canonical key is stored).
    pub fn new(slit_length: f64, s_final: f64, extrapolation: &str) -> Result<Self, DesmearError> {
        if !(slit_length.is_finite() && slit_length > 0.0) {
            return Err(DesmearError::InvalidInput(format!(
                "slit length must be finite and > 0 (got {slit_length})"
            )));
        }
        if !s_final.is_finite() {
            return Err(DesmearError::InvalidInput(format!(
                "sFinal must be finite (got {s_final})"
            )));
        }
        let extrapolation = extrap::canonical_name(extrapolation)?.to_string();

        Ok(Self {
            slit_length,
            s_final,
            extrapolation,
            weighting: FeedbackWeighting::default(),
            budget: IterationBudget::Count(DEFAULT_ITERATIONS),
            weighted_transition: false,
            uncertainty: UncertaintyMode::default(),
            tail_weighting: TailWeighting::default(),
        })
    }

    pub fn with_weighting(mut self, weighting: FeedbackWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_budget(mut self, budget: IterationBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_weighted_transition(mut self, enabled: bool) -> Self {
        self.weighted_transition = enabled;
        self
    }

    pub fn with_uncertainty(mut self, mode: UncertaintyMode) -> Self {
        self.uncertainty = mode;
        self
    }

    pub fn with_tail_weighting(mut self, weighting: TailWeighting) -> Self {
        self.tail_weighting = weighting;
        self
    }

    pub fn slit_length(&self) -> f64 {
        self.slit_length
    }

    pub fn s_final(&self) -> f64 {
        self.s_final
    }

    pub fn extrapolation(&self) -> &str {
        &self.extrapolation
    }

    pub fn weighting(&self) -> FeedbackWeighting {
        self.weighting
    }

    pub fn budget(&self) -> IterationBudget {
        self.budget
    }

    pub fn weighted_transition(&self) -> bool {
        self.weighted_transition
    }

    pub fn uncertainty(&self) -> UncertaintyMode {
        self.uncertainty
    }

    pub fn tail_weighting(&self) -> TailWeighting {
        self.tail_weighting
    }

    /// Check the parameters against a specific curve:
    ///
    /// - `q[0] < sFinal < q[last]`
    /// - at least two samples in the extrapolation tail window
    pub fn validate(&self, curve: &ScatteringCurve) -> Result<(), DesmearError> {
        let (q_min, q_max) = (curve.q_min(), curve.q_max());
        if !(self.s_final > q_min && self.s_final < q_max) {
            return Err(DesmearError::SFinalOutOfRange {
                s_final: self.s_final,
                q_min,
                q_max,
            });
        }
        let found = crate::smear::tail_window(curve.q(), self.s_final).len();
        if found < 2 {
            return Err(DesmearError::InsufficientData {
                context: "the extrapolation fit above sFinal",
                needed: 2,
                found,
            });
        }
        Ok(())
    }
}

impl Default for DesmearParams {
    fn default() -> Self {
        Self {
            slit_length: DEFAULT_SLIT_LENGTH,
            s_final: DEFAULT_S_FINAL,
            extrapolation: DEFAULT_EXTRAPOLATION.to_string(),
            weighting: FeedbackWeighting::default(),
            budget: IterationBudget::Count(DEFAULT_ITERATIONS),
            weighted_transition: false,
            uncertainty: UncertaintyMode::default(),
            tail_weighting: TailWeighting::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> ScatteringCurve {
        let q: Vec<f64> = (1..=10).map(|i| i as f64 * 0.01).collect();
        let n = q.len();
        ScatteringCurve::new(q, vec![1.0; n], vec![0.1; n]).unwrap()
    }

    #[test]
    fn new_rejects_bad_slit_length_and_unknown_extrapolation() {
        assert!(matches!(
            DesmearParams::new(0.0, 0.05, "linear"),
            Err(DesmearError::InvalidInput(_))
        ));
        assert!(matches!(
            DesmearParams::new(0.08, 0.05, "cubic"),
            Err(DesmearError::UnknownExtrapolation { .. })
        ));
    }

    #[test]
    fn extrapolation_key_is_canonicalized() {
        let params = DesmearParams::new(0.08, 0.05, "PORod").unwrap();
        assert_eq!(params.extrapolation(), "Porod");
    }

    #[test]
    fn validate_checks_s_final_range_and_tail_size() {
        let c = curve();
        assert!(DesmearParams::new(0.08, 0.05, "linear").unwrap().validate(&c).is_ok());

        let above = DesmearParams::new(0.08, 0.5, "linear").unwrap();
        assert!(matches!(above.validate(&c), Err(DesmearError::SFinalOutOfRange { .. })));

        let below = DesmearParams::new(0.08, 0.005, "linear").unwrap();
        assert!(matches!(below.validate(&c), Err(DesmearError::SFinalOutOfRange { .. })));

        // Window [0.09] after dropping the last sample: one point only.
        let thin = DesmearParams::new(0.08, 0.085, "linear").unwrap();
        assert!(matches!(
            thin.validate(&c),
            Err(DesmearError::InsufficientData { found: 1, .. })
        ));
    }

    #[test]
    fn defaults_match_documented_values() {
        let p = DesmearParams::default();
        assert_eq!(p.slit_length(), 0.08);
        assert_eq!(p.s_final(), 0.08);
        assert_eq!(p.extrapolation(), "linear");
        assert_eq!(p.weighting(), FeedbackWeighting::Fast);
        assert_eq!(p.budget(), IterationBudget::Count(10));
        assert!(!p.weighted_transition());
    }
}
