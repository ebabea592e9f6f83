//! Plotters-powered log-log intensity chart widget for Ratatui.
//!
//! Plotters draws nicer axes than Ratatui's built-in `Chart` widget and needs
//! less manual work for ticks. Output goes into the Ratatui buffer through
//! `plotters-ratatui-backend`.
//!
//! All series are in `(log10 q, log10 I)` coordinates.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A render-only chart description; all series and bounds are computed
/// outside the render call.
pub struct SasPlottersChart<'a> {
    /// Measured (smeared) intensity, drawn as points.
    pub measured: &'a [(f64, f64)],
    /// Current desmeared estimate `C`, drawn as a line.
    pub desmeared: &'a [(f64, f64)],
    /// Smeared model `S` of the current estimate, drawn as a line.
    pub smeared: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for SasPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let desmeared_color = RGBColor(0, 255, 255); // cyan
            let smeared_color = RGBColor(255, 255, 0); // yellow
            let measured_color = WHITE;

            chart.draw_series(LineSeries::new(self.smeared.iter().copied(), &smeared_color))?;
            chart.draw_series(LineSeries::new(self.desmeared.iter().copied(), &desmeared_color))?;

            // `Pixel` rather than `Circle`: the backend maps circle radii to
            // canvas units and draws them far too large.
            chart.draw_series(
                self.measured
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), measured_color)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
