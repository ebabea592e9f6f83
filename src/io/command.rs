//! Command input files (`.inp`).
//!
//! Seven lines, first whitespace token of each is used:
//!
//! ```text
//! test1.smr     input curve (absolute, or relative to the .inp directory)
//! test1.dsm     output curve (same rule)
//! 0.08          slit length
//! linear        extrapolation form
//! 0.08          sFinal
//! 20            iterations (0 = unbounded)
//! fast          feedback weighting
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{DesmearParams, FeedbackWeighting, IterationBudget};
use crate::error::DesmearError;
use crate::extrap;

/// Parameters as read from (or to be written to) a `.inp` file.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInput {
    pub input: PathBuf,
    pub output: PathBuf,
    pub slit_length: f64,
    pub extrapolation: String,
    pub s_final: f64,
    pub budget: IterationBudget,
    pub weighting: FeedbackWeighting,
}

impl CommandInput {
    /// Build validated run parameters (other settings at their defaults).
    pub fn params(&self) -> Result<DesmearParams, DesmearError> {
        Ok(DesmearParams::new(self.slit_length, self.s_final, &self.extrapolation)?
            .with_weighting(self.weighting)
            .with_budget(self.budget))
    }
}

pub fn read_command_file(path: &Path) -> Result<CommandInput, DesmearError> {
    let text = fs::read_to_string(path).map_err(|e| DesmearError::CommandFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    parse_command_input(&text, path, base)
}

/// Parse `.inp` text; relative curve paths are resolved against `base`.
pub fn parse_command_input(text: &str, path: &Path, base: &Path) -> Result<CommandInput, DesmearError> {
    let fail = |reason: String| DesmearError::CommandFile {
        path: path.to_path_buf(),
        reason,
    };

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 7 {
        return Err(fail(format!("expected 7 lines, found {}", lines.len())));
    }
    let item = |n: usize, what: &'static str| {
        lines[n]
            .split_whitespace()
            .next()
            .ok_or_else(|| fail(format!("line {} ({what}) is empty", n + 1)))
    };
    let number = |n: usize, what: &'static str| -> Result<f64, DesmearError> {
        let tok = item(n, what)?;
        tok.parse::<f64>()
            .map_err(|_| fail(format!("line {} ({what}): '{tok}' is not a number", n + 1)))
    };

    let input = base.join(item(0, "input file")?);
    let output = base.join(item(1, "output file")?);
    let slit_length = number(2, "slit length")?;
    let extrapolation = extrap::canonical_name(item(3, "extrapolation")?)?.to_string();
    let s_final = number(4, "sFinal")?;
    let iterations_tok = item(5, "iterations")?;
    let iterations = iterations_tok
        .parse::<i64>()
        .map_err(|_| fail(format!("line 6 (iterations): '{iterations_tok}' is not an integer")))?;
    let weighting: FeedbackWeighting = item(6, "feedback weighting")?.parse()?;

    Ok(CommandInput {
        input,
        output,
        slit_length,
        extrapolation,
        s_final,
        budget: IterationBudget::from_count(iterations.unsigned_abs() as usize),
        weighting,
    })
}

/// Write a `.inp` file. Curve paths inside the `.inp` directory are stored relative to it.
pub fn write_command_file(path: &Path, cmd: &CommandInput) -> Result<(), DesmearError> {
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let text = format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
        relative_to(&cmd.input, base).display(),
        relative_to(&cmd.output, base).display(),
        cmd.slit_length,
        cmd.extrapolation,
        cmd.s_final,
        cmd.budget.as_count(),
        cmd.weighting,
    );
    fs::write(path, text).map_err(|e| DesmearError::WriteFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn relative_to(target: &Path, base: &Path) -> PathBuf {
    if base.as_os_str().is_empty() {
        return target.to_path_buf();
    }
    target
        .strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| target.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST1: &str = "test1.smr\ntest1.dsm\n0.08\nlinear\n0.08\n20\nfast\n";

    #[test]
    fn parses_the_seven_fields_relative_to_base() {
        let cmd = parse_command_input(TEST1, Path::new("/data/test1.inp"), Path::new("/data")).unwrap();
        assert_eq!(cmd.input, PathBuf::from("/data/test1.smr"));
        assert_eq!(cmd.output, PathBuf::from("/data/test1.dsm"));
        assert_eq!(cmd.slit_length, 0.08);
        assert_eq!(cmd.extrapolation, "linear");
        assert_eq!(cmd.s_final, 0.08);
        assert_eq!(cmd.budget, IterationBudget::Count(20));
        assert_eq!(cmd.weighting, FeedbackWeighting::Fast);
        assert!(cmd.params().is_ok());
    }

    #[test]
    fn trailing_comments_and_absolute_paths() {
        let text = "/abs/in.smr   SMR file\nout.dsm  DSM\n0.1 slit\nPorod\n0.05\n0   forever\nChiSqr\n";
        let cmd = parse_command_input(text, Path::new("x.inp"), Path::new("/base")).unwrap();
        assert_eq!(cmd.input, PathBuf::from("/abs/in.smr"));
        assert_eq!(cmd.output, PathBuf::from("/base/out.dsm"));
        assert_eq!(cmd.extrapolation, "Porod");
        assert_eq!(cmd.budget, IterationBudget::Unbounded);
        assert_eq!(cmd.weighting, FeedbackWeighting::ChiSqr);
    }

    #[test]
    fn short_or_bad_files_are_command_errors() {
        let err = parse_command_input("a\nb\n0.08\n", Path::new("x.inp"), Path::new("")).unwrap_err();
        assert!(matches!(err, DesmearError::CommandFile { .. }));

        let bad = TEST1.replace("0.08\nlinear", "wide\nlinear");
        let err = parse_command_input(&bad, Path::new("x.inp"), Path::new("")).unwrap_err();
        assert!(err.to_string().contains("slit length"));

        let unknown = TEST1.replace("fast", "slow");
        let err = parse_command_input(&unknown, Path::new("x.inp"), Path::new("")).unwrap_err();
        assert!(matches!(err, DesmearError::UnknownWeighting { .. }));
    }

    #[test]
    fn write_then_read_keeps_paths_relative() {
        let dir = std::env::temp_dir().join(format!("slit-desmear-inp-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("run.inp");
        let cmd = CommandInput {
            input: dir.join("a.smr"),
            output: dir.join("a.dsm"),
            slit_length: 0.05,
            extrapolation: "powerlaw".to_string(),
            s_final: 0.1,
            budget: IterationBudget::Unbounded,
            weighting: FeedbackWeighting::Constant,
        };
        write_command_file(&path, &cmd).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("a.smr\na.dsm\n0.05\npowerlaw\n0.1\n0\nconstant\n"));
        assert_eq!(read_command_file(&path).unwrap(), cmd);
        fs::remove_dir_all(&dir).ok();
    }
}
