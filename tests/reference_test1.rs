//! Reference run on the classic `test1.smr` curve.
//!
//! The data file is not redistributed. Drop it into `tests/data/` and run
//! `cargo test -- --ignored`.

use std::path::Path;

use approx::assert_relative_eq;
use slit_desmear::desmear::DesmearSession;
use slit_desmear::domain::{DesmearParams, FeedbackWeighting, IterationBudget};
use slit_desmear::io::read_qrs;

const EXPECTED_CHI_SQUARED: [f64; 10] = [
    12982255.997449555,
    1368042.0757172147,
    19048.7129764,
    5992.12476839,
    1476.83231416,
    566.385118142,
    293.855006653,
    194.322940725,
    158.47186882,
    135.627852795,
];

#[test]
#[ignore = "needs tests/data/test1.smr"]
fn test1_chi_squared_sequence() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/test1.smr");
    let curve = read_qrs(&path).unwrap();
    let params = DesmearParams::new(0.08, 0.08, "linear")
        .unwrap()
        .with_weighting(FeedbackWeighting::Fast)
        .with_budget(IterationBudget::Count(9));
    let mut session = DesmearSession::new(curve, params).unwrap();
    session.run(|_| false).unwrap();

    let chi = session.chi_squared();
    assert_eq!(chi.len(), EXPECTED_CHI_SQUARED.len());
    for (got, want) in chi.iter().zip(EXPECTED_CHI_SQUARED) {
        assert_relative_eq!(*got, want, max_relative = 1e-9);
    }
}
