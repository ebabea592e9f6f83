//! `I(q) = A·q^p`, fitted as a straight line in `ln I` vs `ln q`.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::TailWeighting;
use crate::error::DesmearError;
use crate::extrap::{Extrapolation, Transformed, accumulate};

pub const NAME: &str = "powerlaw";

#[derive(Debug, Clone, Default)]
pub struct PowerLaw {
    weighting: TailWeighting,
    a: f64,
    p: f64,
}

impl PowerLaw {
    pub fn new(weighting: TailWeighting) -> Self {
        Self {
            weighting,
            a: 0.0,
            p: 0.0,
        }
    }

    pub fn amplitude(&self) -> f64 {
        self.a
    }

    pub fn exponent(&self) -> f64 {
        self.p
    }
}

impl Extrapolation for PowerLaw {
    fn name(&self) -> &'static str {
        NAME
    }

    fn formula(&self) -> &'static str {
        "I(q) = A * q^p"
    }

    fn fit(&mut self, q: &[f64], y: &[f64], dy: &[f64]) -> Result<(), DesmearError> {
        let reg = accumulate(q, y, dy, self.weighting, |q, y, dy| {
            if q <= 0.0 || y <= 0.0 {
                return Err(DesmearError::InvalidInput(format!(
                    "power-law extrapolation needs q > 0 and I > 0 (got I({q}) = {y})"
                )));
            }
            // d(ln y) = dy / y
            Ok(Transformed {
                x: q.ln(),
                y: y.ln(),
                sigma: dy / y,
            })
        })?;
        let (ln_a, p) = reg.linear_regression()?;
        self.a = ln_a.exp();
        self.p = p;
        Ok(())
    }

    fn evaluate(&self, q: f64) -> f64 {
        self.a * q.powf(self.p)
    }

    fn coefficients(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([("A".to_string(), self.a), ("p".to_string(), self.p)])
    }
}

impl fmt::Display for PowerLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "power law: I(q) = {} * q^({})", self.a, self.p)
    }
}
