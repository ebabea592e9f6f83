mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use approx::assert_relative_eq;
use slit_desmear::desmear::{DesmearSession, StopReason, spawn_worker};
use slit_desmear::domain::{DesmearParams, FeedbackWeighting, IterationBudget, ScatteringCurve};
use slit_desmear::io::{CommandInput, read_command_file, read_qrs, write_command_file, write_qrs};

fn porod_params(curve: &ScatteringCurve, iterations: usize) -> DesmearParams {
    let params = DesmearParams::new(0.08, 0.1, "Porod")
        .unwrap()
        .with_weighting(FeedbackWeighting::Fast)
        .with_budget(IterationBudget::from_count(iterations));
    params.validate(curve).unwrap();
    params
}

fn mean_relative_error(estimate: &[f64], truth: &[f64], n: usize) -> f64 {
    estimate
        .iter()
        .zip(truth)
        .take(n)
        .map(|(e, t)| ((e - t) / t).abs())
        .sum::<f64>()
        / n as f64
}

#[test]
fn desmearing_recovers_the_unsmeared_curve() {
    let data = common::synthetic();
    let curve = data.measured.clone();
    let mut session = DesmearSession::new(curve.clone(), porod_params(&curve, 10)).unwrap();
    let stop = session.run(|_| false).unwrap();
    assert_eq!(stop, StopReason::BudgetExhausted);

    let chi = session.chi_squared();
    assert_eq!(chi.len(), 11);
    assert!(chi[10] < chi[0] * 1e-2, "{chi:?}");
    assert!(chi.windows(2).all(|w| w[1] < w[0]), "{chi:?}");

    // Low-q region, well inside the measured range.
    let before = mean_relative_error(curve.intensity(), &data.truth, 40);
    let after = mean_relative_error(session.desmeared(), &data.truth, 40);
    assert!(after < 0.5 * before, "before={before} after={after}");
}

#[test]
fn flat_curve_is_a_fixed_point() {
    let curve = common::flat_curve(20, 4.0);
    let params = DesmearParams::new(0.05, 0.1, "constant").unwrap();
    let mut session = DesmearSession::new(curve.clone(), params).unwrap();

    for (s, i) in session.smeared().iter().zip(curve.intensity()) {
        assert_relative_eq!(*s, *i, max_relative = 1e-12);
    }
    assert!(session.latest_chi_squared() < 1e-18);

    session.iterate().unwrap();
    for c in session.desmeared() {
        assert_relative_eq!(*c, 4.0, max_relative = 1e-12);
    }
    assert_relative_eq!(session.extrapolation().coefficients()["B"], 4.0, max_relative = 1e-12);
}

#[test]
fn reset_matches_a_fresh_session() {
    let data = common::synthetic();
    let curve = data.measured;
    let fresh = DesmearSession::new(curve.clone(), porod_params(&curve, 3)).unwrap();

    let mut session = DesmearSession::new(curve.clone(), porod_params(&curve, 3)).unwrap();
    session.run(|_| false).unwrap();
    session.reset().unwrap();

    assert_eq!(session.chi_squared(), fresh.chi_squared());
    assert_eq!(session.smeared(), fresh.smeared());
    assert_eq!(session.desmeared(), fresh.desmeared());
}

#[test]
fn command_file_drives_a_complete_run() {
    let dir = common::scratch_dir("inp");
    let data = common::synthetic();
    let curve = &data.measured;

    let smr = dir.join("synth.smr");
    write_qrs(&smr, curve.q(), curve.intensity(), curve.uncertainty()).unwrap();

    let inp = dir.join("synth.inp");
    let cmd = CommandInput {
        input: smr.clone(),
        output: dir.join("synth.dsm"),
        slit_length: 0.08,
        extrapolation: "Porod".to_string(),
        s_final: 0.1,
        budget: IterationBudget::Count(4),
        weighting: FeedbackWeighting::Fast,
    };
    write_command_file(&inp, &cmd).unwrap();
    assert_eq!(std::fs::read_to_string(&inp).unwrap().lines().next(), Some("synth.smr"));

    let read_back = read_command_file(&inp).unwrap();
    assert_eq!(read_back, cmd);

    let mut session = DesmearSession::new(read_qrs(&read_back.input).unwrap(), read_back.params().unwrap()).unwrap();
    session.run(|_| false).unwrap();
    let (q, c, dc) = session.desmeared_curve();
    write_qrs(&read_back.output, q, c, dc).unwrap();

    let dsm = read_qrs(&read_back.output).unwrap();
    assert_eq!(dsm.len(), curve.len());
    for (written, computed) in dsm.intensity().iter().zip(session.desmeared()) {
        assert_relative_eq!(*written, *computed, max_relative = 1e-5);
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn worker_streams_every_iteration_and_returns_the_session() {
    let data = common::synthetic();
    let curve = data.measured;
    let session = DesmearSession::new(curve.clone(), porod_params(&curve, 4)).unwrap();

    let handle = spawn_worker(session, Arc::new(AtomicBool::new(false)));
    let iterations: Vec<usize> = handle.snapshots().iter().map(|s| s.iteration).collect();
    let outcome = handle.join().unwrap();

    assert_eq!(iterations, vec![1, 2, 3, 4]);
    assert_eq!(outcome.result.unwrap(), StopReason::BudgetExhausted);
    assert_eq!(outcome.session.iteration_count(), 4);
}

#[test]
fn cancelled_worker_stops_between_iterations() {
    let data = common::synthetic();
    let curve = data.measured;
    let params = porod_params(&curve, 0);
    assert!(params.budget().is_unbounded());
    let session = DesmearSession::new(curve, params).unwrap();

    let handle = spawn_worker(session, Arc::new(AtomicBool::new(false)));
    let first = handle.snapshots().recv().unwrap();
    assert_eq!(first.iteration, 1);
    handle.cancel();
    let outcome = handle.join().unwrap();

    assert_eq!(outcome.result.unwrap(), StopReason::Cancelled);
    let n = outcome.session.iteration_count();
    assert!(n >= 1);
    assert_eq!(outcome.session.chi_squared().len(), n + 1);
}
