//! Feedback weighting: how the residual `I - S` corrects `C`.

use crate::domain::FeedbackWeighting;
use crate::error::DesmearError;

/// Per-sample weights for the next correction.
///
/// `chi_squared` is the history so far; `ChiSqr` weighting needs at least one entry.
pub fn feedback_weights(
    weighting: FeedbackWeighting,
    c: &[f64],
    s: &[f64],
    chi_squared: &[f64],
) -> Vec<f64> {
    match weighting {
        FeedbackWeighting::Constant => vec![1.0; c.len()],
        FeedbackWeighting::ChiSqr => {
            let ratio = match (chi_squared.first(), chi_squared.last()) {
                (Some(first), Some(last)) => first / last,
                _ => 1.0,
            };
            vec![2.0 * ratio.sqrt(); c.len()]
        }
        FeedbackWeighting::Fast => c.iter().zip(s).map(|(ci, si)| ci / si).collect(),
    }
}

/// `C[i] + weight[i]·(I[i] - S[i])`, rejecting NaN and infinity.
pub fn refine(c: &[f64], intensity: &[f64], s: &[f64], weights: &[f64]) -> Result<Vec<f64>, DesmearError> {
    c.iter()
        .zip(intensity)
        .zip(s)
        .zip(weights)
        .enumerate()
        .map(|(index, (((ci, ii), si), wi))| {
            let next = ci + wi * (ii - si);
            if next.is_finite() {
                Ok(next)
            } else {
                Err(DesmearError::NonFinite {
                    stage: "the refined desmeared intensity",
                    index,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_and_fast_weights() {
        let c = [2.0, 6.0];
        let s = [1.0, 3.0];
        assert_eq!(feedback_weights(FeedbackWeighting::Constant, &c, &s, &[]), vec![1.0, 1.0]);
        assert_eq!(feedback_weights(FeedbackWeighting::Fast, &c, &s, &[]), vec![2.0, 2.0]);
    }

    #[test]
    fn chisqr_weight_uses_first_and_latest_history() {
        let w = feedback_weights(FeedbackWeighting::ChiSqr, &[1.0; 3], &[1.0; 3], &[400.0, 50.0, 25.0]);
        assert_eq!(w.len(), 3);
        for v in w {
            assert_relative_eq!(v, 8.0);
        }
    }

    #[test]
    fn fast_refinement_is_multiplicative() {
        // C/S * (I - S) + C = C * I / S
        let c = [10.0, 20.0];
        let i = [4.0, 9.0];
        let s = [5.0, 10.0];
        let w = feedback_weights(FeedbackWeighting::Fast, &c, &s, &[]);
        let next = refine(&c, &i, &s, &w).unwrap();
        assert_relative_eq!(next[0], 8.0);
        assert_relative_eq!(next[1], 18.0);
    }

    #[test]
    fn zero_smeared_value_is_reported() {
        let w = feedback_weights(FeedbackWeighting::Fast, &[1.0, 1.0], &[1.0, 0.0], &[]);
        let err = refine(&[1.0, 1.0], &[1.0, 2.0], &[1.0, 0.0], &w).unwrap_err();
        assert!(matches!(err, DesmearError::NonFinite { index: 1, .. }));
    }
}
