//! Prompt-driven parameter entry (`desmear interactive`).
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the prompter asks one question per parameter, showing the default in
//!   brackets; an empty answer takes the default
//!
//! The prompter is generic over its input and output so it can be driven
//! from a script in tests.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::domain::{
    DEFAULT_EXTRAPOLATION, DEFAULT_ITERATIONS, DEFAULT_S_FINAL, DEFAULT_SLIT_LENGTH, FeedbackWeighting,
    IterationBudget,
};
use crate::error::AppError;
use crate::extrap;
use crate::io::CommandInput;

/// Default directory recursion depth when looking for curve files.
const DEFAULT_SEARCH_DEPTH: usize = 2;

/// Everything the interactive session asks for up front.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptedRun {
    pub command: CommandInput,
    /// Draw a residual plot after every iteration.
    pub plot_each_iteration: bool,
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line (no question).
    pub fn say(&mut self, text: &str) -> Result<(), AppError> {
        writeln!(self.output, "{text}").map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))
    }

    /// Ask until `parse` accepts the answer. Empty answers take `default`.
    fn ask<T, F>(&mut self, question: &str, default: &str, mut parse: F) -> Result<T, AppError>
    where
        F: FnMut(&str) -> Result<T, String>,
    {
        loop {
            write!(self.output, "{question} [{default}]: ")
                .and_then(|_| self.output.flush())
                .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

            let mut line = String::new();
            let bytes = self
                .input
                .read_line(&mut line)
                .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;
            if bytes == 0 {
                return Err(AppError::new(2, "No input received. Use `desmear run` for non-interactive use."));
            }

            let answer = match line.trim() {
                "" => default,
                other => other,
            };
            match parse(answer) {
                Ok(value) => return Ok(value),
                Err(msg) => self.say(&msg)?,
            }
        }
    }

    pub fn ask_text(&mut self, question: &str, default: &str) -> Result<String, AppError> {
        self.ask(question, default, |s| Ok(s.to_string()))
    }

    /// Ask for a strictly positive number.
    pub fn ask_positive(&mut self, question: &str, default: f64) -> Result<f64, AppError> {
        self.ask(question, &default.to_string(), |s| match s.parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
            _ => Err(format!("'{s}' is not a positive number.")),
        })
    }

    pub fn ask_count(&mut self, question: &str, default: usize) -> Result<usize, AppError> {
        self.ask(question, &default.to_string(), |s| {
            s.parse::<usize>()
                .map_err(|_| format!("'{s}' is not a whole number."))
        })
    }

    pub fn ask_yes_no(&mut self, question: &str, default: bool) -> Result<bool, AppError> {
        let default = if default { "y" } else { "n" };
        self.ask(question, default, |s| match s.to_ascii_lowercase().as_str() {
            "y" | "yes" => Ok(true),
            "n" | "no" => Ok(false),
            _ => Err("Please answer y or n.".to_string()),
        })
    }

    /// Ask for all run parameters. `found` lists candidate curve files,
    /// which may be picked by number.
    pub fn prompt_run(&mut self, found: &[PathBuf]) -> Result<PromptedRun, AppError> {
        if !found.is_empty() {
            self.say(&format!("Found {} curve file(s):", found.len()))?;
            for (idx, path) in found.iter().enumerate() {
                self.say(&format!("{:>3}) {}", idx + 1, pretty_path(path)))?;
            }
        }

        let default_input = found.first().map(|p| pretty_path(p)).unwrap_or_default();
        let input = self.ask("Input file (number or path)", &default_input, |s| {
            if let Some(path) = s.parse::<usize>().ok().and_then(|n| found.get(n.wrapping_sub(1))) {
                return Ok(path.clone());
            }
            let path = PathBuf::from(s);
            if path.is_file() {
                Ok(path)
            } else {
                Err(format!("Curve file not found: {s}"))
            }
        })?;

        let default_output = input.with_extension("dsm");
        let output = PathBuf::from(self.ask_text("Output file", &default_output.display().to_string())?);
        let slit_length = self.ask_positive("Slit length", DEFAULT_SLIT_LENGTH)?;

        let forms = extrap::available().join(", ");
        let extrapolation = self.ask(
            &format!("Extrapolation form ({forms})"),
            DEFAULT_EXTRAPOLATION,
            |s| {
                extrap::canonical_name(s)
                    .map(str::to_string)
                    .map_err(|e| e.to_string())
            },
        )?;
        let s_final = self.ask_positive("sFinal (start of the extrapolation tail)", DEFAULT_S_FINAL)?;
        let iterations = self.ask_count("Iterations (0 = ask after each one)", DEFAULT_ITERATIONS)?;

        let weightings = FeedbackWeighting::ALL.map(FeedbackWeighting::name).join(", ");
        let weighting = self.ask(
            &format!("Feedback weighting ({weightings})"),
            FeedbackWeighting::default().name(),
            |s| s.parse::<FeedbackWeighting>().map_err(|e| e.to_string()),
        )?;
        let plot_each_iteration = self.ask_yes_no("Plot residuals after each iteration", false)?;

        Ok(PromptedRun {
            command: CommandInput {
                input,
                output,
                slit_length,
                extrapolation,
                s_final,
                budget: IterationBudget::from_count(iterations),
                weighting,
            },
            plot_each_iteration,
        })
    }
}

/// Discover curve files (`*.smr`, `*.qrs`) under the current directory, in a
/// deterministic order.
pub fn discover_curve_files() -> Vec<PathBuf> {
    find_curve_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_curve_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_curve_files_inner(root, 0, max_depth, &mut out);
    out.sort_by_key(|p| pretty_path(p));
    out
}

fn find_curve_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if !should_skip_dir(&path) {
                find_curve_files_inner(&path, depth + 1, max_depth, out);
            }
            continue;
        }

        let is_curve = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("smr") || ext.eq_ignore_ascii_case("qrs"));
        if file_type.is_file() && is_curve {
            out.push(path);
        }
    }
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(script: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn empty_answers_take_defaults_and_bad_answers_are_asked_again() {
        let mut p = prompter("\nabc\n-1\n0.05\n");
        assert_eq!(p.ask_positive("Slit length", 0.08).unwrap(), 0.08);
        assert_eq!(p.ask_positive("Slit length", 0.08).unwrap(), 0.05);
        let shown = String::from_utf8(p.output).unwrap();
        assert!(shown.contains("Slit length [0.08]: "));
        assert!(shown.contains("'abc' is not a positive number."));
        assert!(shown.contains("'-1' is not a positive number."));
    }

    #[test]
    fn yes_no_and_end_of_input() {
        let mut p = prompter("Y\nno\n");
        assert!(p.ask_yes_no("Continue?", false).unwrap());
        assert!(!p.ask_yes_no("Continue?", true).unwrap());
        let err = p.ask_yes_no("Continue?", true).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn full_run_prompt_with_a_listed_file() {
        let dir = std::env::temp_dir().join(format!("slit-desmear-prompt-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let smr = dir.join("test1.smr");
        fs::write(&smr, "0.01 1 0.1\n0.02 1 0.1\n").unwrap();

        let script = "1\n\n0.1\nporod\n0.05\n0\nchisqr\ny\n";
        let mut p = prompter(script);
        let run = p.prompt_run(std::slice::from_ref(&smr)).unwrap();

        assert_eq!(run.command.input, smr);
        assert_eq!(run.command.output, dir.join("test1.dsm"));
        assert_eq!(run.command.slit_length, 0.1);
        assert_eq!(run.command.extrapolation, "Porod");
        assert_eq!(run.command.s_final, 0.05);
        assert_eq!(run.command.budget, IterationBudget::Unbounded);
        assert_eq!(run.command.weighting, FeedbackWeighting::ChiSqr);
        assert!(run.plot_each_iteration);

        fs::remove_dir_all(&dir).ok();
    }
}
