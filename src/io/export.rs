//! Export per-sample results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::CurveColumns;
use crate::error::DesmearError;

/// Write one row per sample: `q, I, dI, C, dC, S, z`.
pub fn write_results_csv(path: &Path, columns: &CurveColumns) -> Result<(), DesmearError> {
    let write_err = |e: std::io::Error| DesmearError::WriteFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let file = File::create(path).map_err(write_err)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "q,intensity,uncertainty,desmeared,desmeared_uncertainty,smeared,residual").map_err(write_err)?;
    for i in 0..columns.q.len() {
        writeln!(
            out,
            "{:.10e},{:.10e},{:.10e},{:.10e},{:.10e},{:.10e},{:.6}",
            columns.q[i],
            columns.intensity[i],
            columns.uncertainty[i],
            columns.desmeared[i],
            columns.desmeared_uncertainty[i],
            columns.smeared[i],
            columns.residuals[i],
        )
        .map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;
    Ok(())
}
