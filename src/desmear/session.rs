//! Iterative desmearing session (Lake's method with Jemian's feedback options).
//!
//! Start from `C = I`, then repeat:
//!
//! ```text
//! S   = smear(C)
//! z   = (S - I) / dI
//! χ²  = Σ z²
//! C  += weight · (I - S)
//! ```
//!
//! A session is built with one smearing pass already done (iteration 0). Each
//! [`DesmearSession::iterate`] either commits a complete new state or leaves the
//! previous one untouched and returns the error.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::desmear::{feedback_weights, propagate_uncertainty, refine};
use crate::domain::{
    CurveColumns, DesmearParams, ExtrapolationSummary, RunReport, ScatteringCurve, UncertaintyMode,
};
use crate::error::DesmearError;
use crate::extrap::Extrapolation;
use crate::smear::{SmearSettings, smear};

/// Why a run loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// The iteration budget is used up.
    BudgetExhausted,
    /// The progress callback asked to stop.
    CallbackRequested,
    /// The cancel flag was raised between iterations.
    Cancelled,
}

/// Everything one smearing pass produces.
struct Evaluation {
    s: Vec<f64>,
    z: Vec<f64>,
    chi_squared: f64,
    extrapolation: Box<dyn Extrapolation>,
}

pub struct DesmearSession {
    curve: ScatteringCurve,
    params: DesmearParams,
    c: Vec<f64>,
    dc: Vec<f64>,
    s: Vec<f64>,
    z: Vec<f64>,
    chi_squared: Vec<f64>,
    extrapolation: Box<dyn Extrapolation>,
}

impl DesmearSession {
    /// Validate `params` against `curve` and run the first smearing pass.
    pub fn new(curve: ScatteringCurve, params: DesmearParams) -> Result<Self, DesmearError> {
        params.validate(&curve)?;
        let c = curve.intensity().to_vec();
        let dc = curve.uncertainty().to_vec();
        let eval = evaluate(&curve, &params, &c, &dc)?;
        info!(
            "desmearing {} points, l0={}, sFinal={}, {} extrapolation, {} weighting: ChiSqr[0]={}",
            curve.len(),
            params.slit_length(),
            params.s_final(),
            params.extrapolation(),
            params.weighting(),
            eval.chi_squared
        );

        Ok(Self {
            curve,
            params,
            c,
            dc,
            s: eval.s,
            z: eval.z,
            chi_squared: vec![eval.chi_squared],
            extrapolation: eval.extrapolation,
        })
    }

    /// Discard all progress and redo the first step from `C = I`.
    pub fn reset(&mut self) -> Result<(), DesmearError> {
        let c = self.curve.intensity().to_vec();
        let dc = self.curve.uncertainty().to_vec();
        let eval = evaluate(&self.curve, &self.params, &c, &dc)?;
        debug!("session reset: ChiSqr[0]={}", eval.chi_squared);

        self.c = c;
        self.dc = dc;
        self.s = eval.s;
        self.z = eval.z;
        self.chi_squared = vec![eval.chi_squared];
        self.extrapolation = eval.extrapolation;
        Ok(())
    }

    /// One refinement: correct `C`, re-smear, append χ².
    ///
    /// Does not consult the iteration budget or any callback.
    pub fn iterate(&mut self) -> Result<(), DesmearError> {
        let intensity = self.curve.intensity();
        let weights = feedback_weights(self.params.weighting(), &self.c, &self.s, &self.chi_squared);
        let c = refine(&self.c, intensity, &self.s, &weights)?;
        let dc = match self.params.uncertainty() {
            UncertaintyMode::Fixed => self.dc.clone(),
            UncertaintyMode::Propagate => {
                propagate_uncertainty(self.curve.q(), intensity, self.curve.uncertainty(), &c)
            }
        };
        let eval = evaluate(&self.curve, &self.params, &c, &dc)?;

        let previous = self.chi_squared[self.chi_squared.len() - 1];
        self.c = c;
        self.dc = dc;
        self.s = eval.s;
        self.z = eval.z;
        self.chi_squared.push(eval.chi_squared);
        self.extrapolation = eval.extrapolation;

        info!(
            "iteration {}: ChiSqr={}",
            self.iteration_count(),
            eval.chi_squared
        );
        if eval.chi_squared >= previous {
            warn!(
                "ChiSqr did not decrease at iteration {} ({} -> {})",
                self.iteration_count(),
                previous,
                eval.chi_squared
            );
        }
        Ok(())
    }

    /// [`iterate`](Self::iterate), then report to `callback`.
    ///
    /// Returns the callback's answer: `true` means stop requested.
    pub fn iterate_and_callback<F>(&mut self, mut callback: F) -> Result<bool, DesmearError>
    where
        F: FnMut(&DesmearSession) -> bool,
    {
        self.iterate()?;
        Ok(callback(self))
    }

    /// Iterate from the current state until the budget is used up or the
    /// callback asks to stop.
    pub fn run<F>(&mut self, callback: F) -> Result<StopReason, DesmearError>
    where
        F: FnMut(&DesmearSession) -> bool,
    {
        self.run_until(callback, None)
    }

    /// [`run`](Self::run) that also stops when `cancel` is raised. The flag is
    /// checked before each iteration, never in the middle of one.
    pub fn run_cancellable<F>(&mut self, callback: F, cancel: &AtomicBool) -> Result<StopReason, DesmearError>
    where
        F: FnMut(&DesmearSession) -> bool,
    {
        self.run_until(callback, Some(cancel))
    }

    /// The classic entry point: restart if progress was made, then [`run`](Self::run).
    pub fn traditional<F>(&mut self, callback: F) -> Result<StopReason, DesmearError>
    where
        F: FnMut(&DesmearSession) -> bool,
    {
        if self.chi_squared.len() > 1 {
            self.reset()?;
        }
        self.run(callback)
    }

    fn run_until<F>(&mut self, mut callback: F, cancel: Option<&AtomicBool>) -> Result<StopReason, DesmearError>
    where
        F: FnMut(&DesmearSession) -> bool,
    {
        let budget = self.params.budget();
        loop {
            if !budget.allows_more(self.iteration_count()) {
                return Ok(StopReason::BudgetExhausted);
            }
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                debug!("run cancelled after {} iterations", self.iteration_count());
                return Ok(StopReason::Cancelled);
            }
            if self.iterate_and_callback(&mut callback)? {
                return Ok(StopReason::CallbackRequested);
            }
        }
    }

    pub fn curve(&self) -> &ScatteringCurve {
        &self.curve
    }

    pub fn params(&self) -> &DesmearParams {
        &self.params
    }

    pub fn q(&self) -> &[f64] {
        self.curve.q()
    }

    pub fn intensity(&self) -> &[f64] {
        self.curve.intensity()
    }

    pub fn uncertainty(&self) -> &[f64] {
        self.curve.uncertainty()
    }

    /// Current desmeared estimate `C`.
    pub fn desmeared(&self) -> &[f64] {
        &self.c
    }

    /// Current `dC`.
    pub fn desmeared_uncertainty(&self) -> &[f64] {
        &self.dc
    }

    /// `S = smear(C)` from the latest pass.
    pub fn smeared(&self) -> &[f64] {
        &self.s
    }

    /// Standardized residuals `z = (S - I) / dI`.
    pub fn residuals(&self) -> &[f64] {
        &self.z
    }

    pub fn chi_squared(&self) -> &[f64] {
        &self.chi_squared
    }

    pub fn latest_chi_squared(&self) -> f64 {
        self.chi_squared[self.chi_squared.len() - 1]
    }

    /// Completed refinements (`len(chi_squared) - 1`).
    pub fn iteration_count(&self) -> usize {
        self.chi_squared.len() - 1
    }

    /// Extrapolation fitted during the latest pass.
    pub fn extrapolation(&self) -> &dyn Extrapolation {
        self.extrapolation.as_ref()
    }

    /// The desmeared curve `(q, C, dC)`.
    pub fn desmeared_curve(&self) -> (&[f64], &[f64], &[f64]) {
        (self.curve.q(), &self.c, &self.dc)
    }

    /// Owned copy of the observable state, safe to hand to another thread.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            iteration: self.iteration_count(),
            chi_squared: self.chi_squared.clone(),
            q: self.curve.q().to_vec(),
            intensity: self.curve.intensity().to_vec(),
            desmeared: self.c.clone(),
            desmeared_uncertainty: self.dc.clone(),
            smeared: self.s.clone(),
            residuals: self.z.clone(),
            extrapolation: self.extrapolation.summary(),
            extrapolation_text: self.extrapolation.to_string(),
        }
    }

    pub fn report(&self, input: Option<String>) -> RunReport {
        RunReport {
            tool: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            input,
            params: self.params.clone(),
            iterations: self.iteration_count(),
            chi_squared: self.chi_squared.clone(),
            extrapolation: Some(self.extrapolation.summary()),
            curve: CurveColumns {
                q: self.curve.q().to_vec(),
                intensity: self.curve.intensity().to_vec(),
                uncertainty: self.curve.uncertainty().to_vec(),
                desmeared: self.c.clone(),
                desmeared_uncertainty: self.dc.clone(),
                smeared: self.s.clone(),
                residuals: self.z.clone(),
            },
        }
    }
}

impl std::fmt::Debug for DesmearSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesmearSession")
            .field("points", &self.curve.len())
            .field("params", &self.params)
            .field("iteration_count", &self.iteration_count())
            .field("chi_squared", &self.latest_chi_squared())
            .finish()
    }
}

/// Read-only copy of a session after some iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub iteration: usize,
    pub chi_squared: Vec<f64>,
    pub q: Vec<f64>,
    pub intensity: Vec<f64>,
    pub desmeared: Vec<f64>,
    pub desmeared_uncertainty: Vec<f64>,
    pub smeared: Vec<f64>,
    pub residuals: Vec<f64>,
    pub extrapolation: ExtrapolationSummary,
    pub extrapolation_text: String,
}

impl SessionSnapshot {
    pub fn latest_chi_squared(&self) -> f64 {
        self.chi_squared.last().copied().unwrap_or(f64::NAN)
    }
}

fn evaluate(
    curve: &ScatteringCurve,
    params: &DesmearParams,
    c: &[f64],
    dc: &[f64],
) -> Result<Evaluation, DesmearError> {
    let (s, extrapolation) = smear(curve.q(), c, dc, &SmearSettings::from(params))?;
    let z: Vec<f64> = s
        .iter()
        .zip(curve.intensity())
        .zip(curve.uncertainty())
        .map(|((si, ii), di)| (si - ii) / di)
        .collect();
    let chi_squared = z.iter().map(|v| v * v).sum();
    Ok(Evaluation {
        s,
        z,
        chi_squared,
        extrapolation,
    })
}
