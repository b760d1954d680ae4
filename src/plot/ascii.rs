//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed series points: `o`, connected with a `-` polyline
//! - forecast points: `+`
//! - bar charts / histograms: `#` runs

use chrono::{Datelike, NaiveDate};

use crate::domain::{ForecastPoint, SeriesPoint};

/// Render a date-keyed sales series, optionally with the forecast appended.
pub fn render_series_plot(
    series: &[SeriesPoint],
    forecast: Option<&[ForecastPoint]>,
    width: usize,
    height: usize,
) -> String {
    let mut observed: Vec<(f64, f64)> = series
        .iter()
        .map(|p| (f64::from(p.date.num_days_from_ce()), p.total_sales))
        .collect();
    let predicted: Vec<(f64, f64)> = forecast
        .unwrap_or(&[])
        .iter()
        .map(|p| (f64::from(p.date.num_days_from_ce()), p.predicted_sales))
        .collect();

    if observed.is_empty() && predicted.is_empty() {
        return "(no data to plot)\n".to_string();
    }

    let width = width.max(10);
    let height = height.max(5);

    // Keep the polyline well-defined even if the input arrived unsorted.
    observed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let (mut x_min, mut x_max) = axis_range(observed.iter().chain(predicted.iter()).map(|p| p.0));
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    let (y_min, y_max) = axis_range(observed.iter().chain(predicted.iter()).map(|p| p.1));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);
    if x_min.is_nan() {
        x_min = 0.0;
        x_max = 1.0;
    }

    let mut grid = vec![vec![' '; width]; height];

    draw_polyline(&mut grid, &observed, x_min, x_max, y_min, y_max);

    for &(x, y) in &observed {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }
    for &(x, y) in &predicted {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = '+';
    }

    // Header with ranges, dates rendered back from ordinals.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: date=[{}, {}] | sales=[{y_min:.2}, {y_max:.2}]\n",
        fmt_ordinal(x_min),
        fmt_ordinal(x_max),
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Horizontal bar chart for ranked totals.
pub fn render_bars(rows: &[(String, f64)], width: usize) -> String {
    if rows.is_empty() {
        return "(no data to plot)\n".to_string();
    }

    let width = width.max(4);
    let max = rows.iter().map(|r| r.1).fold(0.0_f64, f64::max);

    let mut out = String::new();
    for (label, value) in rows {
        let filled = if max > 0.0 {
            ((value / max) * width as f64).round().max(0.0) as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{:<16} {} {:.2}\n",
            truncate(label, 16),
            "#".repeat(filled.min(width)),
            value
        ));
    }
    out
}

/// Binned histogram of a value distribution (the unit-price view).
pub fn render_histogram(values: &[f64], bins: usize, width: usize) -> String {
    if values.is_empty() {
        return "(no data to plot)\n".to_string();
    }

    let bins = bins.max(1);
    let width = width.max(4);

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };
    let step = span / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / step).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let max_count = counts.iter().copied().max().unwrap_or(0).max(1);

    let mut out = String::new();
    for (i, count) in counts.iter().enumerate() {
        let bin_lo = lo + step * i as f64;
        let bin_hi = bin_lo + step;
        let filled = ((*count as f64 / max_count as f64) * width as f64).round() as usize;
        out.push_str(&format!(
            "[{bin_lo:>9.2}, {bin_hi:>9.2}) {:>5} {}\n",
            count,
            "#".repeat(filled.min(width)),
        ));
    }
    out
}

fn axis_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo.is_finite() && hi.is_finite() {
        (lo, hi)
    } else {
        (f64::NAN, f64::NAN)
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    if min.is_nan() || max.is_nan() {
        return (0.0, 1.0);
    }
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(
    grid: &mut [Vec<char>],
    points: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if points.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in points {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
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

fn fmt_ordinal(ordinal: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(ordinal.round() as i32)
        .map(|d| d.to_string())
        .unwrap_or_else(|| format!("{ordinal:.0}"))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
