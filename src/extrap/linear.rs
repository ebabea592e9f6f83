//! `I(q) = B + m·q`

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::TailWeighting;
use crate::error::DesmearError;
use crate::extrap::{Extrapolation, Transformed, accumulate};

pub const NAME: &str = "linear";

#[derive(Debug, Clone, Default)]
pub struct Linear {
    weighting: TailWeighting,
    b: f64,
    m: f64,
}

impl Linear {
    pub fn new(weighting: TailWeighting) -> Self {
        Self {
            weighting,
            b: 0.0,
            m: 0.0,
        }
    }

    pub fn intercept(&self) -> f64 {
        self.b
    }

    pub fn slope(&self) -> f64 {
        self.m
    }
}

impl Extrapolation for Linear {
    fn name(&self) -> &'static str {
        NAME
    }

    fn formula(&self) -> &'static str {
        "I(q) = B + m*q"
    }

    fn fit(&mut self, q: &[f64], y: &[f64], dy: &[f64]) -> Result<(), DesmearError> {
        let reg = accumulate(q, y, dy, self.weighting, |x, y, sigma| {
            Ok(Transformed { x, y, sigma })
        })?;
        let (b, m) = reg.linear_regression()?;
        self.b = b;
        self.m = m;
        Ok(())
    }

    fn evaluate(&self, q: f64) -> f64 {
        self.b + self.m * q
    }

    fn coefficients(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([("B".to_string(), self.b), ("m".to_string(), self.m)])
    }
}

impl fmt::Display for Linear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "linear: I(q) = {} + q*({})", self.b, self.m)
    }
}
