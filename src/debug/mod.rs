//! Markdown run log for inspecting a desmearing run after the fact.
//!
//! One file per run, named after the input and a local timestamp:
//! `<dir>/desmear_<stem>_<YYYYmmdd_HHMMSS>.md`.

use std::fmt::Write as _;
use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::desmear::DesmearSession;
use crate::error::AppError;
use crate::io::format_g;

pub fn write_run_log(dir: &Path, session: &DesmearSession, input: Option<&Path>) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(2, format!("Failed to create log dir {}: {e}", dir.display())))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let stem = input
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "session".to_string());
    let path = dir.join(format!("desmear_{stem}_{ts}.md"));

    let text = render_run_log(session, input, &Local::now().to_rfc3339());
    write(&path, text).map_err(|e| AppError::new(2, format!("Failed to write run log {}: {e}", path.display())))?;

    Ok(path)
}

/// The log body; `generated` is the timestamp line.
pub fn render_run_log(session: &DesmearSession, input: Option<&Path>, generated: &str) -> String {
    let params = session.params();
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "# desmear run log");
    let _ = writeln!(out, "- generated: {generated}");
    if let Some(path) = input {
        let _ = writeln!(out, "- input: {}", path.display());
    }
    let _ = writeln!(out, "- points: {}", session.q().len());
    let _ = writeln!(out, "- slit_length: {}", params.slit_length());
    let _ = writeln!(out, "- s_final: {}", params.s_final());
    let _ = writeln!(out, "- extrapolation: {}", params.extrapolation());
    let _ = writeln!(out, "- tail_weighting: {:?}", params.tail_weighting());
    let _ = writeln!(out, "- feedback: {} ({})", params.weighting(), params.weighting().formula());
    let _ = writeln!(out, "- budget: {}", params.budget());
    let _ = writeln!(out, "- smooth_transition: {}", params.weighted_transition());
    let _ = writeln!(out, "- uncertainty: {:?}", params.uncertainty());

    let _ = writeln!(out, "\n## Extrapolation");
    let _ = writeln!(out, "{}", session.extrapolation());
    let _ = writeln!(out, "\n| coefficient | value |");
    let _ = writeln!(out, "| - | - |");
    for (name, value) in session.extrapolation().coefficients() {
        let _ = writeln!(out, "| {name} | {} |", format_g(value));
    }

    let _ = writeln!(out, "\n## ChiSqr history");
    let _ = writeln!(out, "| iteration | ChiSqr |");
    let _ = writeln!(out, "| - | - |");
    for (i, chi) in session.chi_squared().iter().enumerate() {
        let _ = writeln!(out, "| {i} | {chi} |");
    }

    let _ = writeln!(out, "\n## Final curve");
    let _ = writeln!(out, "| q | I | C | dC | S | z |");
    let _ = writeln!(out, "| - | - | - | - | - | - |");
    let rows = session
        .q()
        .iter()
        .zip(session.intensity())
        .zip(session.desmeared())
        .zip(session.desmeared_uncertainty())
        .zip(session.smeared())
        .zip(session.residuals());
    for (((((q, i), c), dc), s), z) in rows {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} |",
            format_g(*q),
            format_g(*i),
            format_g(*c),
            format_g(*dc),
            format_g(*s),
            format_g(*z)
        );
    }

    out
}
