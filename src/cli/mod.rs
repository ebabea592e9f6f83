//! Command-line parsing for the `desmear` binary.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the numerical code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_EXTRAPOLATION, DEFAULT_ITERATIONS, DEFAULT_S_FINAL, DEFAULT_SLIT_LENGTH, FeedbackWeighting,
    TailWeighting, UncertaintyMode,
};

pub mod prompt;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "desmear", version, about = "Slit-length desmearing of small-angle scattering data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Desmear a curve file with parameters given as flags.
    Run(RunArgs),
    /// Desmear using a 7-line `.inp` command file.
    Inp(InpArgs),
    /// Ask for each parameter in turn (the default when no arguments are given).
    Interactive(InteractiveArgs),
    /// Write a synthetic slit-smeared curve for trying things out.
    Synth(SynthArgs),
    /// List the extrapolation forms and feedback weightings.
    Extrapolations,
    /// Plot a previously exported JSON run report.
    Plot(PlotArgs),
    /// Launch the live terminal monitor.
    ///
    /// Iterations run on a background thread; the chart, ChiSqr history and
    /// status update after each one.
    Tui(TuiArgs),
}

/// The seven desmearing parameters of a `.inp` file, as flags.
#[derive(Debug, Args, Clone)]
pub struct ParamArgs {
    /// Slit length l0 (same units as q).
    #[arg(short = 'l', long, default_value_t = DEFAULT_SLIT_LENGTH)]
    pub slit_length: f64,

    /// q at which the extrapolation tail fit starts.
    #[arg(short = 's', long, default_value_t = DEFAULT_S_FINAL)]
    pub s_final: f64,

    /// Extrapolation form (constant, linear, powerlaw, Porod).
    #[arg(short = 'e', long, default_value = DEFAULT_EXTRAPOLATION)]
    pub extrapolation: String,

    /// Number of refinement iterations (0 = ask after each one).
    #[arg(short = 'n', long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Feedback weighting (constant, ChiSqr, fast).
    #[arg(short = 'w', long, default_value = "fast")]
    pub weighting: FeedbackWeighting,
}

/// Options beyond the `.inp` parameter set.
#[derive(Debug, Args, Clone, Default)]
pub struct TuningArgs {
    /// Blend interpolated and extrapolated values across (sFinal, q_last].
    #[arg(long)]
    pub smooth_transition: bool,

    /// How the desmeared uncertainty evolves.
    #[arg(long, value_enum, default_value_t = UncertaintyMode::Fixed)]
    pub uncertainty: UncertaintyMode,

    /// Weighting of the extrapolation tail regression.
    #[arg(long, value_enum, default_value_t = TailWeighting::Unweighted)]
    pub tail_weighting: TailWeighting,
}

/// Terminal output and export options.
#[derive(Debug, Args, Clone)]
pub struct DisplayArgs {
    /// Print a residual plot after each iteration and a log-log plot at the end.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 78)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export a JSON run report.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Export the final curve columns to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Write a markdown run log into this directory.
    #[arg(long = "log-dir", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Slit-smeared input curve (q, I, dI columns).
    #[arg(short = 'i', long, value_name = "SMR")]
    pub input: PathBuf,

    /// Desmeared output curve (defaults to the input with a `.dsm` extension).
    #[arg(short = 'o', long, value_name = "DSM")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub params: ParamArgs,

    #[command(flatten)]
    pub tuning: TuningArgs,

    #[command(flatten)]
    pub display: DisplayArgs,
}

#[derive(Debug, Args, Clone)]
pub struct InpArgs {
    /// Command file: input, output, slit length, extrapolation, sFinal, iterations, weighting.
    #[arg(value_name = "INP")]
    pub file: PathBuf,

    #[command(flatten)]
    pub tuning: TuningArgs,

    #[command(flatten)]
    pub display: DisplayArgs,
}

#[derive(Debug, Args, Clone)]
pub struct InteractiveArgs {
    #[command(flatten)]
    pub tuning: TuningArgs,

    #[command(flatten)]
    pub display: DisplayArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Where to write the smeared, noisy curve.
    #[arg(short = 'o', long, value_name = "SMR")]
    pub output: PathBuf,

    /// Also write the unsmeared model curve here.
    #[arg(long, value_name = "QRS")]
    pub truth: Option<PathBuf>,

    /// Number of samples.
    #[arg(long, default_value_t = 150)]
    pub points: usize,

    #[arg(long, default_value_t = 0.002)]
    pub q_min: f64,

    #[arg(long, default_value_t = 0.25)]
    pub q_max: f64,

    /// Slit length used to smear the model.
    #[arg(short = 'l', long, default_value_t = DEFAULT_SLIT_LENGTH)]
    pub slit_length: f64,

    /// Debye-Bueche correlation length.
    #[arg(long, default_value_t = 60.0)]
    pub correlation_length: f64,

    /// Relative noise level.
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Report JSON produced by `desmear run --export-json`.
    #[arg(long, value_name = "JSON")]
    pub report: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 78)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Take all parameters from a `.inp` command file.
    #[arg(long, value_name = "INP", conflicts_with = "input")]
    pub inp: Option<PathBuf>,

    /// Slit-smeared input curve.
    #[arg(short = 'i', long, value_name = "SMR", required_unless_present = "inp")]
    pub input: Option<PathBuf>,

    /// Desmeared output curve written by the `w` key.
    #[arg(short = 'o', long, value_name = "DSM")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub params: ParamArgs,

    #[command(flatten)]
    pub tuning: TuningArgs,
}
