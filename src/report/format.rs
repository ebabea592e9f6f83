//! Formatted terminal output for desmearing runs.
//!
//! We keep formatting code in one place so:
//! - the numerical code stays free of presentation concerns
//! - output changes are localized (the tests below pin the layout)

use std::path::Path;

use crate::domain::{DesmearParams, FeedbackWeighting, ScatteringCurve};
use crate::desmear::DesmearSession;
use crate::extrap;

/// Header printed before the first iteration.
pub fn format_run_header(curve: &ScatteringCurve, params: &DesmearParams, input: Option<&Path>) -> String {
    let mut out = String::new();

    out.push_str("=== desmear - slit-length desmearing (Lake/Jemian) ===\n");
    if let Some(path) = input {
        out.push_str(&format!("Input: {}\n", path.display()));
    }
    out.push_str(&format!(
        "Points: n={} | q=[{:.6}, {:.6}]\n",
        curve.len(),
        curve.q_min(),
        curve.q_max()
    ));
    out.push_str(&format!("Slit length: {}\n", params.slit_length()));
    out.push_str(&format!("sFinal: {}\n", params.s_final()));
    out.push_str(&format!("Extrapolation: {}\n", params.extrapolation()));
    out.push_str(&format!(
        "Feedback: {} ({})\n",
        params.weighting(),
        params.weighting().formula()
    ));
    out.push_str(&format!("Iterations: {}\n", params.budget()));
    if params.weighted_transition() {
        out.push_str("Smooth transition: on\n");
    }
    out.push('\n');

    out
}

/// One progress line; `chi_squared` is the full history so far.
pub fn format_iteration_line(chi_squared: &[f64]) -> String {
    let iteration = chi_squared.len().saturating_sub(1);
    let current = chi_squared.last().copied().unwrap_or(f64::NAN);
    match chi_squared.len() {
        0 | 1 => format!("#{iteration:>4}  ChiSqr={current:.6e}"),
        n => {
            let previous = chi_squared[n - 2];
            format!("#{iteration:>4}  ChiSqr={current:.6e}  ratio={:.4}", current / previous)
        }
    }
}

/// Final summary: χ² table and the fitted extrapolation.
pub fn format_run_summary(session: &DesmearSession) -> String {
    let mut out = String::new();

    out.push_str(&format!("\nCompleted iterations: {}\n", session.iteration_count()));
    out.push_str(&format!("Final ChiSqr: {:.6e}\n", session.latest_chi_squared()));
    out.push_str(&format!("Extrapolation: {}\n", session.extrapolation()));

    out.push_str("\nChiSqr history:\n");
    out.push_str(&format!("{:>6} {:>16}\n", "iter", "ChiSqr"));
    out.push_str(&format!("{:-<6} {:-<16}\n", "", ""));
    for (i, chi) in session.chi_squared().iter().enumerate() {
        out.push_str(&format!("{i:>6} {chi:>16.6e}\n"));
    }

    out
}

/// Registered extrapolation forms and feedback weightings.
pub fn format_catalogue() -> String {
    let mut out = String::new();

    out.push_str("Extrapolation forms:\n");
    for name in extrap::available() {
        let formula = extrap::create(name).map(|f| f.formula()).unwrap_or("?");
        out.push_str(&format!("  {name:<10} {formula}\n"));
    }

    out.push_str("\nFeedback weightings:\n");
    for w in FeedbackWeighting::ALL {
        let marker = if w == FeedbackWeighting::default() { " (default)" } else { "" };
        out.push_str(&format!("  {:<10} {}{marker}\n", w.name(), w.formula()));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> ScatteringCurve {
        let q: Vec<f64> = (1..=10).map(|i| i as f64 * 0.01).collect();
        ScatteringCurve::new(q, vec![1.0; 10], vec![0.1; 10]).unwrap()
    }

    #[test]
    fn header_lists_the_parameters() {
        let params = DesmearParams::new(0.05, 0.05, "porod").unwrap();
        let txt = format_run_header(&curve(), &params, Some(Path::new("a.smr")));
        assert!(txt.contains("Input: a.smr\n"));
        assert!(txt.contains("Points: n=10 | q=[0.010000, 0.100000]\n"));
        assert!(txt.contains("Extrapolation: Porod\n"));
        assert!(txt.contains("Feedback: fast (weight = CorrectedI / SmearedI)\n"));
        assert!(txt.contains("Iterations: 10\n"));
        assert!(!txt.contains("Smooth transition"));
    }

    #[test]
    fn iteration_lines_show_the_ratio_after_the_first_step() {
        assert_eq!(format_iteration_line(&[100.0]), "#   0  ChiSqr=1.000000e2");
        assert_eq!(
            format_iteration_line(&[100.0, 25.0]),
            "#   1  ChiSqr=2.500000e1  ratio=0.2500"
        );
    }

    #[test]
    fn catalogue_names_every_form_and_weighting() {
        let txt = format_catalogue();
        for name in extrap::available() {
            assert!(txt.contains(name), "{name} missing");
        }
        assert!(txt.contains("I(q) = B + Cp / q^4"));
        assert!(txt.contains("fast       weight = CorrectedI / SmearedI (default)"));
    }
}
