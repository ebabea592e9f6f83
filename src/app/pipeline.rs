//! Shared desmearing pipeline used by the CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! read curve -> build session -> (iterate) -> write curve + optional exports
//!
//! The front-ends then focus on presentation (printing vs widgets) and on how
//! iterations are driven (callback vs worker thread).

use std::path::{Path, PathBuf};

use crate::cli::DisplayArgs;
use crate::desmear::DesmearSession;
use crate::domain::DesmearParams;
use crate::error::AppError;
use crate::io::{CommandInput, read_qrs, write_qrs, write_report_json, write_results_csv};

/// Where a run reads from and writes to.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub input: PathBuf,
    pub output: PathBuf,
    pub params: DesmearParams,
}

impl RunPlan {
    pub fn from_command(cmd: &CommandInput, params: DesmearParams) -> Self {
        Self {
            input: cmd.input.clone(),
            output: cmd.output.clone(),
            params,
        }
    }
}

/// Default output path: the input with a `.dsm` extension.
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension("dsm")
}

/// Read the input curve and run the first smearing pass.
pub fn open_session(plan: &RunPlan) -> Result<DesmearSession, AppError> {
    let curve = read_qrs(&plan.input)?;
    Ok(DesmearSession::new(curve, plan.params.clone())?)
}

/// Write the desmeared curve `(q, C, dC)`.
pub fn write_output(session: &DesmearSession, output: &Path) -> Result<(), AppError> {
    let (q, c, dc) = session.desmeared_curve();
    write_qrs(output, q, c, dc)?;
    Ok(())
}

/// Write the output curve plus whatever exports were requested.
///
/// Returns the run log path when one was written.
pub fn write_results(
    session: &DesmearSession,
    plan: &RunPlan,
    display: &DisplayArgs,
) -> Result<Option<PathBuf>, AppError> {
    write_output(session, &plan.output)?;

    if display.export_json.is_some() || display.export_csv.is_some() {
        let report = session.report(Some(plan.input.display().to_string()));
        if let Some(path) = &display.export_json {
            write_report_json(path, &report)?;
        }
        if let Some(path) = &display.export_csv {
            write_results_csv(path, &report.curve)?;
        }
    }

    match &display.log_dir {
        Some(dir) => Ok(Some(crate::debug::write_run_log(dir, session, Some(plan.input.as_path()))?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_qrs;

    #[test]
    fn round_trip_through_the_pipeline() {
        let dir = std::env::temp_dir().join(format!("slit-desmear-pipeline-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("flat.smr");
        let text: String = (1..=12).map(|i| format!("{} 3 0.1\n", i as f64 * 0.01)).collect();
        std::fs::write(&input, text).unwrap();

        let plan = RunPlan {
            output: default_output(&input),
            input,
            params: DesmearParams::new(0.05, 0.06, "constant").unwrap(),
        };
        let mut session = open_session(&plan).unwrap();
        session.iterate().unwrap();

        let display = DisplayArgs {
            plot: false,
            width: 40,
            height: 10,
            export_json: Some(dir.join("flat.json")),
            export_csv: Some(dir.join("flat.csv")),
            log_dir: None,
        };
        assert!(write_results(&session, &plan, &display).unwrap().is_none());

        let written = read_qrs(&dir.join("flat.dsm")).unwrap();
        assert_eq!(written.len(), 12);
        assert!(dir.join("flat.json").is_file());
        assert!(dir.join("flat.csv").is_file());
        std::fs::remove_dir_all(&dir).ok();
    }
}
