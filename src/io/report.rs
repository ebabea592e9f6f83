//! Read/write JSON run reports.
//!
//! A run report is the portable record of one desmearing run:
//! - parameters (slit length, sFinal, extrapolation, weighting, budget)
//! - the χ² history
//! - the final extrapolation and its coefficients
//! - the final `(q, I, dI, C, dC, S, z)` columns
//!
//! The schema is defined by `domain::RunReport`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::RunReport;
use crate::error::DesmearError;

pub fn write_report_json(path: &Path, report: &RunReport) -> Result<(), DesmearError> {
    let write_err = |reason: String| DesmearError::WriteFile {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::create(path).map_err(|e| write_err(e.to_string()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, report).map_err(|e| write_err(e.to_string()))?;
    out.flush().map_err(|e| write_err(e.to_string()))?;
    Ok(())
}

pub fn read_report_json(path: &Path) -> Result<RunReport, DesmearError> {
    let read_err = |reason: String| DesmearError::DataFile {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|e| read_err(e.to_string()))?;
    serde_json::from_reader(file).map_err(|e| read_err(format!("invalid run report JSON: {e}")))
}
