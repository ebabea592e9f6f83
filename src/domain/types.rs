//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during desmearing
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DesmearError;

/// One-dimensional SAS data: `I(q) ± dI(q)`.
///
/// Invariants (checked by [`ScatteringCurve::new`]):
/// - all three columns have the same length, at least 2
/// - `q` is finite, strictly positive, and strictly increasing
/// - `uncertainty` is finite and strictly positive
/// - `intensity` is finite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatteringCurve {
    q: Vec<f64>,
    intensity: Vec<f64>,
    uncertainty: Vec<f64>,
}

impl ScatteringCurve {
    pub fn new(q: Vec<f64>, intensity: Vec<f64>, uncertainty: Vec<f64>) -> Result<Self, DesmearError> {
        let n = q.len();
        if intensity.len() != n || uncertainty.len() != n {
            return Err(DesmearError::InvalidInput(format!(
                "column lengths differ: q={n}, intensity={}, uncertainty={}",
                intensity.len(),
                uncertainty.len()
            )));
        }
        if n < 2 {
            return Err(DesmearError::InsufficientData {
                context: "a scattering curve",
                needed: 2,
                found: n,
            });
        }
        for (i, &qi) in q.iter().enumerate() {
            if !(qi.is_finite() && qi > 0.0) {
                return Err(DesmearError::InvalidInput(format!(
                    "q[{i}]={qi} must be finite and > 0"
                )));
            }
            if i > 0 && qi <= q[i - 1] {
                return Err(DesmearError::InvalidInput(format!(
                    "q must be strictly increasing: q[{}]={} then q[{i}]={qi}",
                    i - 1,
                    q[i - 1]
                )));
            }
        }
        if let Some((i, v)) = intensity.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(DesmearError::InvalidInput(format!(
                "intensity[{i}]={v} is not finite"
            )));
        }
        if let Some((i, v)) = uncertainty
            .iter()
            .enumerate()
            .find(|(_, v)| !(v.is_finite() && **v > 0.0))
        {
            return Err(DesmearError::InvalidInput(format!(
                "uncertainty[{i}]={v} must be finite and > 0"
            )));
        }

        Ok(Self {
            q,
            intensity,
            uncertainty,
        })
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    /// Always false: a valid curve holds at least two samples.
    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn q(&self) -> &[f64] {
        &self.q
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn uncertainty(&self) -> &[f64] {
        &self.uncertainty
    }

    pub fn q_min(&self) -> f64 {
        self.q[0]
    }

    pub fn q_max(&self) -> f64 {
        self.q[self.q.len() - 1]
    }
}

/// Rule converting the residual `I - S` into a correction of `C`.
///
/// `C[i] += weight[i] * (I[i] - S[i])`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeedbackWeighting {
    /// `weight = 1`
    #[serde(rename = "constant")]
    Constant,
    /// `weight = 2 * sqrt(ChiSqr[0] / ChiSqr[last])`, uniform over the curve.
    #[serde(rename = "ChiSqr")]
    ChiSqr,
    /// `weight[i] = C[i] / S[i]`. Converges fastest; the recommended choice.
    #[default]
    #[serde(rename = "fast")]
    Fast,
}

impl FeedbackWeighting {
    pub const ALL: [FeedbackWeighting; 3] = [
        FeedbackWeighting::Constant,
        FeedbackWeighting::ChiSqr,
        FeedbackWeighting::Fast,
    ];

    /// Registered selector name.
    pub fn name(self) -> &'static str {
        match self {
            FeedbackWeighting::Constant => "constant",
            FeedbackWeighting::ChiSqr => "ChiSqr",
            FeedbackWeighting::Fast => "fast",
        }
    }

    pub fn formula(self) -> &'static str {
        match self {
            FeedbackWeighting::Constant => "weight = 1.0",
            FeedbackWeighting::ChiSqr => "weight = 2*SQRT(ChiSqr(0) / ChiSqr(i))",
            FeedbackWeighting::Fast => "weight = CorrectedI / SmearedI",
        }
    }

    fn known_names() -> String {
        Self::ALL
            .iter()
            .map(|w| w.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FeedbackWeighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeedbackWeighting {
    type Err = DesmearError;

    /// Selector names match case-insensitively (`chisqr` == `ChiSqr`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DesmearError::UnknownWeighting {
                name: wanted.to_string(),
                known: Self::known_names(),
            })
    }
}

/// How many refinement steps a run may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IterationBudget {
    /// Stop unconditionally after this many refinements.
    Count(usize),
    /// Iterate until the progress callback (or a cancel flag) asks to stop.
    Unbounded,
}

impl IterationBudget {
    /// The command-line and `.inp` convention: `0` means unbounded.
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            IterationBudget::Unbounded
        } else {
            IterationBudget::Count(count)
        }
    }

    /// Inverse of [`IterationBudget::from_count`].
    pub fn as_count(self) -> usize {
        match self {
            IterationBudget::Count(n) => n,
            IterationBudget::Unbounded => 0,
        }
    }

    /// Is another refinement allowed after `completed` iterations?
    pub fn allows_more(self, completed: usize) -> bool {
        match self {
            IterationBudget::Count(n) => completed < n,
            IterationBudget::Unbounded => true,
        }
    }

    pub fn is_unbounded(self) -> bool {
        self == IterationBudget::Unbounded
    }
}

impl fmt::Display for IterationBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IterationBudget::Count(n) => write!(f, "{n}"),
            IterationBudget::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// How the uncertainty `dC` of the desmeared curve evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UncertaintyMode {
    /// `dC = dI` for the whole session.
    #[default]
    Fixed,
    /// Re-estimate `dC` after each refinement from relative input error plus
    /// local point scatter, then smooth.
    Propagate,
}

/// Statistical weighting of the extrapolation tail regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TailWeighting {
    /// Every tail point counts equally.
    #[default]
    Unweighted,
    /// Points weighted by `1 / dy²` (in the transformed coordinates).
    InverseVariance,
}

/// Fitted extrapolation, as stored in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrapolationSummary {
    pub name: String,
    pub formula: String,
    pub coefficients: BTreeMap<String, f64>,
}

/// Final per-sample columns of a desmearing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveColumns {
    pub q: Vec<f64>,
    pub intensity: Vec<f64>,
    pub uncertainty: Vec<f64>,
    pub desmeared: Vec<f64>,
    pub desmeared_uncertainty: Vec<f64>,
    pub smeared: Vec<f64>,
    pub residuals: Vec<f64>,
}

/// A saved run report (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub tool: String,
    pub input: Option<String>,
    pub params: crate::domain::DesmearParams,
    pub iterations: usize,
    pub chi_squared: Vec<f64>,
    pub extrapolation: Option<ExtrapolationSummary>,
    pub curve: CurveColumns,
}
