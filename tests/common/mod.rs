#![allow(dead_code)]

use std::path::PathBuf;

use slit_desmear::data::{SynthConfig, SynthData, generate_synthetic};
use slit_desmear::domain::ScatteringCurve;

/// Effectively noise-free synthetic curve (Debye-Bueche, slit length 0.08).
pub fn synthetic() -> SynthData {
    let config = SynthConfig {
        points: 120,
        noise: 0.0,
        floor: 1e-6,
        ..SynthConfig::default()
    };
    generate_synthetic(&config).expect("synthetic curve")
}

/// `I = value` everywhere on a uniform grid `0.01..=n*0.01`.
pub fn flat_curve(n: usize, value: f64) -> ScatteringCurve {
    let q: Vec<f64> = (1..=n).map(|i| i as f64 * 0.01).collect();
    ScatteringCurve::new(q, vec![value; n], vec![0.1 * value; n]).expect("flat curve")
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("slit-desmear-it-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("scratch dir");
    dir
}
