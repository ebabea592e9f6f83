//! `I(q) = B + Cp/q⁴`
//!
//! Multiplying through by `q⁴` gives `q⁴·I = Cp + B·q⁴`, a straight line in
//! `q⁴`: the regression intercept is `Cp` (the Porod coefficient) and the
//! slope is `B` (the flat background).

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::TailWeighting;
use crate::error::DesmearError;
use crate::extrap::{Extrapolation, Transformed, accumulate};

pub const NAME: &str = "Porod";

#[derive(Debug, Clone, Default)]
pub struct Porod {
    weighting: TailWeighting,
    b: f64,
    cp: f64,
}

impl Porod {
    pub fn new(weighting: TailWeighting) -> Self {
        Self {
            weighting,
            b: 0.0,
            cp: 0.0,
        }
    }

    /// Flat background `B`.
    pub fn background(&self) -> f64 {
        self.b
    }

    /// Coefficient `Cp` of the `1/q⁴` term.
    pub fn porod_coefficient(&self) -> f64 {
        self.cp
    }
}

impl Extrapolation for Porod {
    fn name(&self) -> &'static str {
        NAME
    }

    fn formula(&self) -> &'static str {
        "I(q) = B + Cp / q^4"
    }

    fn fit(&mut self, q: &[f64], y: &[f64], dy: &[f64]) -> Result<(), DesmearError> {
        let reg = accumulate(q, y, dy, self.weighting, |q, y, dy| {
            let q4 = q.powi(4);
            Ok(Transformed {
                x: q4,
                y: q4 * y,
                sigma: q4 * dy,
            })
        })?;
        let (cp, b) = reg.linear_regression()?;
        self.cp = cp;
        self.b = b;
        Ok(())
    }

    fn evaluate(&self, q: f64) -> f64 {
        self.b + self.cp / q.powi(4)
    }

    fn coefficients(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([("B".to_string(), self.b), ("Cp".to_string(), self.cp)])
    }
}

impl fmt::Display for Porod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Porod law: I(q) = {} + ({}) / q^4", self.b, self.cp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn background_is_constant_term_and_cp_multiplies_inverse_q4() {
        let (b, cp) = (0.25, 4.0e-6);
        let q: Vec<f64> = (0..12).map(|i| 0.05 + 0.01 * i as f64).collect();
        let y: Vec<f64> = q.iter().map(|v| b + cp / v.powi(4)).collect();
        let dy = vec![0.01; q.len()];

        let mut f = Porod::new(TailWeighting::Unweighted);
        f.fit(&q, &y, &dy).unwrap();
        assert_relative_eq!(f.background(), b, max_relative = 1e-8);
        assert_relative_eq!(f.porod_coefficient(), cp, max_relative = 1e-8);

        let coeffs = f.coefficients();
        assert_relative_eq!(coeffs["B"], b, max_relative = 1e-8);
        assert_relative_eq!(coeffs["Cp"], cp, max_relative = 1e-8);
    }

    #[test]
    fn evaluate_approaches_background_at_large_q() {
        let mut f = Porod::new(TailWeighting::Unweighted);
        f.fit(&[0.1, 0.2, 0.3], &[1.0 + 1e-4 / 1e-4, 1.0 + 1e-4 / 16e-4, 1.0 + 1e-4 / 81e-4], &[0.1; 3])
            .unwrap();
        assert_relative_eq!(f.evaluate(1.0e3), 1.0, max_relative = 1e-6);
    }
}
