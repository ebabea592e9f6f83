//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds validated desmearing parameters
//! - drives the iterations and prints progress
//! - writes the output curve and optional exports

use std::io::{self, BufRead, Write};
use std::path::Path;

use clap::Parser;

use crate::cli::prompt::{Prompter, discover_curve_files};
use crate::cli::{Command, DisplayArgs, InpArgs, InteractiveArgs, ParamArgs, PlotArgs, RunArgs, SynthArgs, TuningArgs};
use crate::data::{SynthConfig, generate_synthetic};
use crate::desmear::DesmearSession;
use crate::domain::{DesmearParams, IterationBudget};
use crate::error::{AppError, DesmearError};
use crate::io::{read_command_file, read_report_json, write_command_file, write_qrs};

pub mod pipeline;

use pipeline::RunPlan;

/// Entry point for the `desmear` binary.
pub fn run() -> Result<(), AppError> {
    // `desmear` alone starts the prompt-driven session and `desmear x.inp`
    // runs a command file. Clap requires a subcommand name, so argv is
    // rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Inp(args) => handle_inp(args),
        Command::Interactive(args) => handle_interactive(args),
        Command::Synth(args) => handle_synth(args),
        Command::Extrapolations => {
            print!("{}", crate::report::format_catalogue());
            Ok(())
        }
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => crate::tui::run(args),
    }
}

/// Validated parameters from the flag groups.
pub fn params_from_args(params: &ParamArgs, tuning: &TuningArgs) -> Result<DesmearParams, DesmearError> {
    let base = DesmearParams::new(params.slit_length, params.s_final, &params.extrapolation)?
        .with_weighting(params.weighting)
        .with_budget(IterationBudget::from_count(params.iterations));
    Ok(apply_tuning(base, tuning))
}

pub fn apply_tuning(params: DesmearParams, tuning: &TuningArgs) -> DesmearParams {
    params
        .with_weighted_transition(tuning.smooth_transition)
        .with_uncertainty(tuning.uncertainty)
        .with_tail_weighting(tuning.tail_weighting)
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let params = params_from_args(&args.params, &args.tuning)?;
    let plan = RunPlan {
        output: args
            .output
            .clone()
            .unwrap_or_else(|| pipeline::default_output(&args.input)),
        input: args.input,
        params,
    };
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    run_in_terminal(&plan, &args.display, args.display.plot, &mut prompter)
}

fn handle_inp(args: InpArgs) -> Result<(), AppError> {
    let cmd = read_command_file(&args.file)?;
    let params = apply_tuning(cmd.params()?, &args.tuning);
    let plan = RunPlan::from_command(&cmd, params);
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    run_in_terminal(&plan, &args.display, args.display.plot, &mut prompter)
}

fn handle_interactive(args: InteractiveArgs) -> Result<(), AppError> {
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    prompter.say("desmear: slit-length desmearing (Lake/Jemian)\n")?;

    let prompted = prompter.prompt_run(&discover_curve_files())?;
    let params = apply_tuning(prompted.command.params()?, &args.tuning);
    let plan = RunPlan::from_command(&prompted.command, params);
    let plot_each = prompted.plot_each_iteration || args.display.plot;
    run_in_terminal(&plan, &args.display, plot_each, &mut prompter)?;

    let inp = plan.output.with_extension("inp");
    if prompter.ask_yes_no(&format!("Save these parameters to {}", inp.display()), false)? {
        write_command_file(&inp, &prompted.command)?;
        prompter.say(&format!("Wrote {}", inp.display()))?;
    }
    Ok(())
}

/// Drive a session with progress printed to stdout.
///
/// With an unbounded budget the user is asked after every iteration whether
/// to continue.
fn run_in_terminal<R: BufRead, W: Write>(
    plan: &RunPlan,
    display: &DisplayArgs,
    plot_each: bool,
    prompter: &mut Prompter<R, W>,
) -> Result<(), AppError> {
    let mut session = pipeline::open_session(plan)?;
    print!(
        "{}",
        crate::report::format_run_header(session.curve(), session.params(), Some(plan.input.as_path()))
    );
    println!("{}", crate::report::format_iteration_line(session.chi_squared()));
    if plot_each {
        print!("{}", crate::plot::render_residual_plot(session.residuals(), display.width, display.height));
    }

    let ask_each = session.params().budget().is_unbounded();
    let mut prompt_error = None;
    let stop = session.run(|s| {
        println!("{}", crate::report::format_iteration_line(s.chi_squared()));
        if plot_each {
            print!("{}", crate::plot::render_residual_plot(s.residuals(), display.width, display.height));
        }
        if !ask_each {
            return false;
        }
        match prompter.ask_yes_no("Continue? (y/n)", true) {
            Ok(more) => !more,
            Err(err) => {
                prompt_error = Some(err);
                true
            }
        }
    })?;
    log::debug!("run stopped: {stop:?}");
    if let Some(err) = prompt_error {
        // Keep what was computed before the prompt failed.
        pipeline::write_output(&session, &plan.output)?;
        return Err(err);
    }

    finish(&session, plan, display)
}

fn finish(session: &DesmearSession, plan: &RunPlan, display: &DisplayArgs) -> Result<(), AppError> {
    print!("{}", crate::report::format_run_summary(session));
    if display.plot {
        println!();
        print!(
            "{}",
            crate::plot::render_loglog_plot(
                session.q(),
                session.intensity(),
                session.desmeared(),
                display.width,
                display.height
            )
        );
    }

    let log_path = pipeline::write_results(session, plan, display)?;
    println!("\nWrote {}", plan.output.display());
    for path in [display.export_json.as_deref(), display.export_csv.as_deref(), log_path.as_deref()]
        .into_iter()
        .flatten()
    {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = SynthConfig {
        points: args.points,
        q_min: args.q_min,
        q_max: args.q_max,
        slit_length: args.slit_length,
        correlation_length: args.correlation_length,
        noise: args.noise,
        seed: args.seed,
        ..SynthConfig::default()
    };
    let data = generate_synthetic(&config)?;
    let curve = &data.measured;
    write_qrs(&args.output, curve.q(), curve.intensity(), curve.uncertainty())?;
    println!(
        "Wrote {} ({} points, q=[{}, {}], slit length {})",
        args.output.display(),
        curve.len(),
        config.q_min,
        config.q_max,
        config.slit_length
    );

    if let Some(path) = &args.truth {
        write_qrs(path, curve.q(), &data.truth, curve.uncertainty())?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let report = read_report_json(&args.report)?;
    let curve = &report.curve;

    println!(
        "{} | {} iterations | final ChiSqr {:.6e}",
        report.input.as_deref().unwrap_or("(no input recorded)"),
        report.iterations,
        report.chi_squared.last().copied().unwrap_or(f64::NAN)
    );
    print!(
        "{}",
        crate::plot::render_loglog_plot(&curve.q, &curve.intensity, &curve.desmeared, args.width, args.height)
    );
    print!("{}", crate::plot::render_residual_plot(&curve.residuals, args.width, args.height));
    Ok(())
}

/// Rewrite argv so `desmear` defaults to `desmear interactive`.
///
/// Rules:
/// - `desmear`                      -> `desmear interactive`
/// - `desmear path/to/file.inp ...` -> `desmear inp path/to/file.inp ...`
/// - `desmear --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("interactive".to_string());
        return argv;
    };

    let is_subcommand = matches!(
        arg1.as_str(),
        "run" | "inp" | "interactive" | "synth" | "extrapolations" | "plot" | "tui" | "help"
    );
    if is_subcommand || arg1.starts_with('-') {
        return argv;
    }

    let is_command_file = Path::new(&arg1)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("inp"));
    if is_command_file {
        argv.insert(1, "inp".to_string());
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_becomes_interactive() {
        assert_eq!(rewrite_args(argv(&["desmear"])), argv(&["desmear", "interactive"]));
    }

    #[test]
    fn inp_path_becomes_inp_subcommand() {
        assert_eq!(
            rewrite_args(argv(&["desmear", "data/test1.inp", "--plot"])),
            argv(&["desmear", "inp", "data/test1.inp", "--plot"])
        );
        assert_eq!(
            rewrite_args(argv(&["desmear", "RUN.INP"])),
            argv(&["desmear", "inp", "RUN.INP"])
        );
    }

    #[test]
    fn subcommands_and_flags_are_left_alone() {
        let cases: [&[&str]; 5] = [
            &["desmear", "run", "-i", "a.smr"],
            &["desmear", "--help"],
            &["desmear", "-V"],
            &["desmear", "extrapolations"],
            &["desmear", "a.smr"],
        ];
        for args in cases {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }

    #[test]
    fn tuning_flags_reach_the_params() {
        let params = ParamArgs {
            slit_length: 0.05,
            s_final: 0.1,
            extrapolation: "POROD".to_string(),
            iterations: 0,
            weighting: crate::domain::FeedbackWeighting::Constant,
        };
        let tuning = TuningArgs {
            smooth_transition: true,
            uncertainty: crate::domain::UncertaintyMode::Propagate,
            tail_weighting: crate::domain::TailWeighting::InverseVariance,
        };
        let p = params_from_args(&params, &tuning).unwrap();
        assert_eq!(p.extrapolation(), "Porod");
        assert_eq!(p.budget(), IterationBudget::Unbounded);
        assert!(p.weighted_transition());
        assert_eq!(p.uncertainty(), crate::domain::UncertaintyMode::Propagate);
        assert_eq!(p.tail_weighting(), crate::domain::TailWeighting::InverseVariance);
    }
}
