//! ASCII plotting for terminal output.
//!
//! Fixed-size character grids, deterministic so the output can be compared
//! verbatim in tests.
//!
//! Two plots:
//! - standardized residuals `z = (S - I)/dI` against sample index (`*` points, `-` zero line)
//! - log-log traces of the measured `I` (`o`) and desmeared `C` (`+`)

/// Residual plot: samples spread evenly across the width, zero line drawn first.
pub fn render_residual_plot(residuals: &[f64], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let finite: Vec<f64> = residuals.iter().copied().filter(|z| z.is_finite()).collect();
    let (z_min, z_max) = value_range(&finite).unwrap_or((-1.0, 1.0));
    // Keep zero inside the frame so the reference line is always visible.
    let (z_min, z_max) = pad_range(z_min.min(0.0), z_max.max(0.0), 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let zero_row = map_y(0.0, z_min, z_max, height);
    draw_line(&mut grid, 0, zero_row, width - 1, zero_row, '-');

    let last = residuals.len().saturating_sub(1).max(1) as f64;
    for (i, &z) in residuals.iter().enumerate() {
        if !z.is_finite() {
            continue;
        }
        let x = map_x(i as f64, 0.0, last, width);
        let y = map_y(z, z_min, z_max, height);
        grid[y][x] = '*';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Residuals: z=(S-I)/dI | n={} | z=[{z_min:.2}, {z_max:.2}]\n",
        residuals.len()
    ));
    push_grid(&mut out, grid);
    out
}

/// Log-log plot of the measured and desmeared intensities against `q`.
///
/// Samples with non-positive `q` or intensity are left out of their trace.
pub fn render_loglog_plot(q: &[f64], measured: &[f64], desmeared: &[f64], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let measured = log_points(q, measured);
    let desmeared = log_points(q, desmeared);

    let xs: Vec<f64> = measured.iter().chain(&desmeared).map(|p| p.0).collect();
    let ys: Vec<f64> = measured.iter().chain(&desmeared).map(|p| p.1).collect();
    let (x_min, x_max) = value_range(&xs).unwrap_or((-3.0, 0.0));
    let (y_min, y_max) = value_range(&ys).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    for &(x, y) in &measured {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }
    // Desmeared points overwrite measured ones where they coincide.
    for &(x, y) in &desmeared {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = '+';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "log10 I vs log10 q: q=[{:.3e}, {:.3e}] | I=[{:.3e}, {:.3e}] | o=measured +=desmeared\n",
        10f64.powf(x_min),
        10f64.powf(x_max),
        10f64.powf(y_min),
        10f64.powf(y_max)
    ));
    push_grid(&mut out, grid);
    out
}

fn log_points(q: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    q.iter()
        .zip(y)
        .filter(|&(&qi, &yi)| qi > 0.0 && yi > 0.0 && yi.is_finite())
        .map(|(&qi, &yi)| (qi.log10(), yi.log10()))
        .collect()
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
}

fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else if min.is_finite() && max.is_finite() {
        Some((min - 0.5, max + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
