//! Ratatui-based live monitor for a desmearing session.
//!
//! Iterations run on a worker thread ([`spawn_worker`]); the UI redraws from
//! the snapshots it sends. Pausing cancels the worker and takes the session
//! back, so single steps and resets run on the UI thread while paused.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline::{self, RunPlan};
use crate::cli::TuiArgs;
use crate::desmear::{DesmearSession, SessionSnapshot, StopReason, WorkerHandle, spawn_worker};
use crate::error::{AppError, DesmearError};
use crate::io::{read_command_file, write_qrs};

mod plotters_chart;

use plotters_chart::SasPlottersChart;

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    let plan = plan_from_args(&args)?;
    // The first smearing pass runs before the terminal switches modes so
    // parameter errors print normally.
    let session = pipeline::open_session(&plan)?;

    // Log records would scribble over the alternate screen.
    if std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(log::LevelFilter::Off);
    }

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(plan, session);
    app.event_loop(&mut terminal)
}

fn plan_from_args(args: &TuiArgs) -> Result<RunPlan, AppError> {
    if let Some(inp) = &args.inp {
        let cmd = read_command_file(inp)?;
        let params = crate::app::apply_tuning(cmd.params()?, &args.tuning);
        return Ok(RunPlan::from_command(&cmd, params));
    }

    let input = args
        .input
        .clone()
        .ok_or_else(|| AppError::new(2, "Provide --input <SMR> or --inp <INP>."))?;
    let params = crate::app::params_from_args(&args.params, &args.tuning)?;
    Ok(RunPlan {
        output: args.output.clone().unwrap_or_else(|| pipeline::default_output(&input)),
        input,
        params,
    })
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Who holds the session right now.
enum Engine {
    Running(WorkerHandle),
    Idle(DesmearSession),
}

struct App {
    plan: RunPlan,
    engine: Option<Engine>,
    latest: SessionSnapshot,
    status: String,
}

impl App {
    fn new(plan: RunPlan, session: DesmearSession) -> Self {
        let latest = session.snapshot();
        let mut app = Self {
            plan,
            engine: Some(Engine::Idle(session)),
            latest,
            status: String::new(),
        };
        app.resume();
        app
    }

    fn is_running(&self) -> bool {
        matches!(self.engine, Some(Engine::Running(_)))
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.poll_worker()? {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.pause()?;
                return Ok(true);
            }
            KeyCode::Char(' ') => {
                if self.is_running() {
                    self.pause()?;
                    self.status = format!("Paused after iteration {}.", self.latest.iteration);
                } else {
                    self.resume();
                }
            }
            KeyCode::Char('n') => self.step(),
            KeyCode::Char('r') => self.reset()?,
            KeyCode::Char('w') => self.write_output(),
            _ => {}
        }
        Ok(false)
    }

    /// Pick up new snapshots and a finished worker. Returns whether anything changed.
    fn poll_worker(&mut self) -> Result<bool, AppError> {
        let Some(Engine::Running(handle)) = &self.engine else {
            return Ok(false);
        };

        let mut changed = false;
        while let Ok(snapshot) = handle.snapshots().try_recv() {
            self.latest = snapshot;
            changed = true;
        }
        if handle.is_finished() {
            self.collect()?;
            changed = true;
        }
        Ok(changed)
    }

    /// Stop the worker (if any) and take the session back.
    fn pause(&mut self) -> Result<(), AppError> {
        if let Some(Engine::Running(handle)) = &self.engine {
            handle.cancel();
            self.collect()?;
        }
        Ok(())
    }

    /// Join a running worker and park its session as idle.
    fn collect(&mut self) -> Result<(), AppError> {
        let handle = match self.engine.take() {
            Some(Engine::Running(handle)) => handle,
            other => {
                self.engine = other;
                return Ok(());
            }
        };

        let outcome = handle.join()?;
        self.latest = outcome.session.snapshot();
        self.status = match outcome.result {
            Ok(StopReason::BudgetExhausted) => format!(
                "Finished {} iterations. w writes {}.",
                self.latest.iteration,
                self.plan.output.display()
            ),
            Ok(StopReason::Cancelled) | Ok(StopReason::CallbackRequested) => {
                format!("Stopped after iteration {}.", self.latest.iteration)
            }
            Err(err) => format!("Iteration failed: {err}"),
        };
        self.engine = Some(Engine::Idle(outcome.session));
        Ok(())
    }

    fn resume(&mut self) {
        let session = match self.engine.take() {
            Some(Engine::Idle(session)) => session,
            other => {
                self.engine = other;
                return;
            }
        };

        if !session.params().budget().allows_more(session.iteration_count()) {
            self.status = "Iteration budget used up: n steps once, r resets.".to_string();
            self.engine = Some(Engine::Idle(session));
            return;
        }
        self.status = "Running...".to_string();
        let cancel = Arc::new(AtomicBool::new(false));
        self.engine = Some(Engine::Running(spawn_worker(session, cancel)));
    }

    fn step(&mut self) {
        let Some(Engine::Idle(session)) = &mut self.engine else {
            self.status = "Pause first (space) to step.".to_string();
            return;
        };
        match session.iterate() {
            Ok(()) => {
                self.latest = session.snapshot();
                self.status = format!("Stepped to iteration {}.", self.latest.iteration);
            }
            Err(err) => self.status = format!("Iteration failed: {err}"),
        }
    }

    fn reset(&mut self) -> Result<(), AppError> {
        self.pause()?;
        if let Some(Engine::Idle(session)) = &mut self.engine {
            match session.reset() {
                Ok(()) => {
                    self.latest = session.snapshot();
                    self.status = "Reset to the first step. space runs.".to_string();
                }
                Err(err) => self.status = format!("Reset failed: {err}"),
            }
        }
        Ok(())
    }

    fn write_output(&mut self) {
        let snap = &self.latest;
        self.status = match write_snapshot(&self.plan.output, snap) {
            Ok(()) => format!(
                "Wrote {} (iteration {}).",
                self.plan.output.display(),
                snap.iteration
            ),
            Err(err) => format!("Write failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let params = &self.plan.params;
        let state = if self.is_running() { "running" } else { "paused" };

        let lines = vec![
            Line::from(vec![
                Span::styled("desmear", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" {} -> {}", self.plan.input.display(), self.plan.output.display())),
            ]),
            Line::from(Span::styled(
                format!(
                    "l0={} | sFinal={} | {} extrapolation | {} feedback | budget {}",
                    params.slit_length(),
                    params.s_final(),
                    params.extrapolation(),
                    params.weighting(),
                    params.budget(),
                ),
                Style::default().fg(Color::Gray),
            )),
            Line::from(Span::styled(
                format!(
                    "{state} | iteration {} | ChiSqr={:.6e}",
                    self.latest.iteration,
                    self.latest.latest_chi_squared()
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(30)])
            .split(area);

        self.draw_chart(frame, chunks[0]);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(8)])
            .split(chunks[1]);
        self.draw_history(frame, side[0]);
        self.draw_extrapolation(frame, side[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("log I vs log q").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = chart_series(&self.latest);
        if series.measured.is_empty() {
            let msg = Paragraph::new("No positive intensities to plot.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let (chart_rect, insets) = chart_layout(inner);
        let widget = SasPlottersChart {
            measured: &series.measured,
            desmeared: &series.desmeared,
            smeared: &series.smeared,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: "q",
            y_label: "I",
            fmt_x: fmt_pow10,
            fmt_y: fmt_pow10,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_history(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = area.height.saturating_sub(2) as usize;
        let history = &self.latest.chi_squared;
        let skip = history.len().saturating_sub(rows);

        let items: Vec<ListItem> = history
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, chi)| ListItem::new(format!("{i:>5}  {chi:>14.6e}")))
            .collect();
        let list = List::new(items).block(Block::default().title("ChiSqr").borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_extrapolation(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let summary = &self.latest.extrapolation;
        let mut lines = vec![Line::from(Span::styled(
            summary.formula.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        for (name, value) in &summary.coefficients {
            lines.push(Line::from(format!("{name:>3} = {value:.6e}")));
        }
        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title(summary.name.clone()).borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "space run/pause  n step  r reset  w write  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn write_snapshot(path: &Path, snap: &SessionSnapshot) -> Result<(), DesmearError> {
    write_qrs(path, &snap.q, &snap.desmeared, &snap.desmeared_uncertainty)
}

struct ChartSeries {
    measured: Vec<(f64, f64)>,
    desmeared: Vec<(f64, f64)>,
    smeared: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Chart series in `(log10 q, log10 I)`; non-positive values are dropped.
fn chart_series(snap: &SessionSnapshot) -> ChartSeries {
    let log_points = |y: &[f64]| -> Vec<(f64, f64)> {
        snap.q
            .iter()
            .zip(y)
            .filter(|&(&q, &v)| q > 0.0 && v > 0.0 && v.is_finite())
            .map(|(&q, &v)| (q.log10(), v.log10()))
            .collect()
    };
    let measured = log_points(&snap.intensity);
    let desmeared = log_points(&snap.desmeared);
    let smeared = log_points(&snap.smeared);

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in measured.iter().chain(&desmeared).chain(&smeared) {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !x_min.is_finite() || !x_max.is_finite() || x_max <= x_min {
        x_min = -3.0;
        x_max = 0.0;
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    ChartSeries {
        measured,
        desmeared,
        smeared,
        x_bounds: [x_min, x_max],
        y_bounds: [y_min - pad, y_max + pad],
    }
}

/// Tick label for a log10 coordinate.
fn fmt_pow10(v: f64) -> String {
    format!("{:.0e}", 10f64.powf(v))
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = fmt_pow10(x_bounds[0] + u * (x_bounds[1] - x_bounds[0]));
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(Paragraph::new(label).style(style), Rect { x: start, y, width, height: 1 });
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = fmt_pow10(y_bounds[0] + u * (y_bounds[1] - y_bounds[0]));
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(Paragraph::new(label).style(style), Rect { x: start, y, width, height: 1 });
    }

    let legend = Paragraph::new("q   (. measured, cyan C, yellow S)")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let legend_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if legend_rect.y < inner.y + inner.height {
        frame.render_widget(legend, legend_rect);
    }

    let y_label = Paragraph::new("I").style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExtrapolationSummary;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            iteration: 2,
            chi_squared: vec![9.0, 4.0, 1.0],
            q: vec![0.01, 0.1, 1.0],
            intensity: vec![100.0, 10.0, 1.0],
            desmeared: vec![1000.0, 100.0, -1.0],
            desmeared_uncertainty: vec![1.0, 1.0, 1.0],
            smeared: vec![100.0, 10.0, 1.0],
            residuals: vec![0.0, 0.0, 0.0],
            extrapolation: ExtrapolationSummary {
                name: "constant".to_string(),
                formula: "I(q) = B".to_string(),
                coefficients: Default::default(),
            },
            extrapolation_text: "constant: I(q) = 1".to_string(),
        }
    }

    #[test]
    fn chart_series_are_log_scaled_and_drop_non_positive_values() {
        let s = chart_series(&snapshot());
        let expected = [(-2.0, 2.0), (-1.0, 1.0), (0.0, 0.0)];
        assert_eq!(s.measured.len(), 3);
        for (&(x, y), (ex, ey)) in s.measured.iter().zip(expected) {
            assert!((x - ex).abs() < 1e-12 && (y - ey).abs() < 1e-12);
        }
        assert_eq!(s.desmeared.len(), 2);
        assert!((s.x_bounds[0] + 2.0).abs() < 1e-12 && s.x_bounds[1].abs() < 1e-12);
        assert!(s.y_bounds[0] < 0.0 && s.y_bounds[1] > 3.0);
    }

    #[test]
    fn pow10_ticks() {
        assert_eq!(fmt_pow10(-2.0), "1e-2");
        assert_eq!(fmt_pow10(3.0), "1e3");
    }
}
