//! `I(q) = B`

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::TailWeighting;
use crate::error::DesmearError;
use crate::extrap::{Extrapolation, Transformed, accumulate};

pub const NAME: &str = "constant";

#[derive(Debug, Clone, Default)]
pub struct Constant {
    weighting: TailWeighting,
    b: f64,
}

impl Constant {
    pub fn new(weighting: TailWeighting) -> Self {
        Self { weighting, b: 0.0 }
    }

    pub fn background(&self) -> f64 {
        self.b
    }
}

impl Extrapolation for Constant {
    fn name(&self) -> &'static str {
        NAME
    }

    fn formula(&self) -> &'static str {
        "I(q) = B"
    }

    fn fit(&mut self, q: &[f64], y: &[f64], dy: &[f64]) -> Result<(), DesmearError> {
        let reg = accumulate(q, y, dy, self.weighting, |x, y, sigma| {
            Ok(Transformed { x, y, sigma })
        })?;
        self.b = reg.mean()?;
        Ok(())
    }

    fn evaluate(&self, _q: f64) -> f64 {
        self.b
    }

    fn coefficients(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([("B".to_string(), self.b)])
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "constant: I(q) = {}", self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fit_is_the_mean_of_the_tail() {
        let mut f = Constant::new(TailWeighting::Unweighted);
        f.fit(&[0.1, 0.2, 0.3], &[2.0, 4.0, 6.0], &[1.0, 1.0, 1.0]).unwrap();
        assert_relative_eq!(f.background(), 4.0);
        assert_eq!(f.evaluate(123.0), f.background());
    }

    #[test]
    fn inverse_variance_weights_favor_precise_points() {
        let mut f = Constant::new(TailWeighting::InverseVariance);
        // Weights 1 and 4: (1*2 + 4*7) / 5 = 6
        f.fit(&[0.1, 0.2], &[2.0, 7.0], &[1.0, 0.5]).unwrap();
        assert_relative_eq!(f.background(), 6.0, max_relative = 1e-12);
    }
}
