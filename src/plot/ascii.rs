//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed prices: `o`
//! - point forecast: `-` line
//! - train/test cutoff: `|` column

use chrono::NaiveDate;

use crate::domain::{Forecast, Observation};

/// Render observed prices against a forecast.
pub fn render_forecast_plot(
    observations: &[Observation],
    forecast: &Forecast,
    cutoff: Option<NaiveDate>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((d_min, d_max)) = date_range(observations, forecast) else {
        return "Plot: nothing to draw\n".to_string();
    };
    let x_span = (d_max - d_min).num_days().max(1) as f64;
    let to_x = |d: NaiveDate| (d - d_min).num_days() as f64;

    let (y_min, y_max) = y_range(observations, forecast).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Line first so the markers overlay it.
    let line: Vec<(f64, f64)> = forecast.points.iter().map(|p| (to_x(p.date), p.yhat)).collect();
    draw_curve(&mut grid, &line, x_span, y_min, y_max);

    if let Some(c) = cutoff.filter(|c| *c >= d_min && *c <= d_max) {
        let x = map_x(to_x(c), x_span, width);
        for row in grid.iter_mut() {
            if row[x] == ' ' {
                row[x] = '|';
            }
        }
    }

    for o in observations {
        let x = map_x(to_x(o.date), x_span, width);
        let y = map_y(o.price, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!("Plot: {d_min}..{d_max} | price=[{y_min:.2}, {y_max:.2}]\n"));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn date_range(observations: &[Observation], forecast: &Forecast) -> Option<(NaiveDate, NaiveDate)> {
    let dates = observations.iter().map(|o| o.date).chain(forecast.points.iter().map(|p| p.date));
    let min = dates.clone().min()?;
    let max = dates.max()?;
    Some((min, max))
}

fn y_range(observations: &[Observation], forecast: &Forecast) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let values = observations
        .iter()
        .map(|o| o.price)
        .chain(forecast.points.iter().map(|p| p.yhat));
    for v in values {
        min_y = min_y.min(v);
        max_y = max_y.max(v);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_span: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = (x / x_span).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_span: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_span, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastPoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn flat_forecast(dates: &[NaiveDate], level: f64) -> Forecast {
        Forecast {
            points: dates
                .iter()
                .map(|&date| ForecastPoint {
                    date,
                    yhat: level,
                    yhat_lower: None,
                    yhat_upper: None,
                    trend: level,
                    additive: 0.0,
                    multiplicative: 0.0,
                })
                .collect(),
            components: Default::default(),
        }
    }

    fn observations() -> Vec<Observation> {
        vec![
            Observation { date: d(2020, 1, 1), price: 1.0 },
            Observation { date: d(2020, 2, 1), price: 2.0 },
        ]
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let fc = flat_forecast(&[d(2020, 1, 1), d(2020, 2, 1)], 1.0);
        let txt = render_forecast_plot(&observations(), &fc, None, 10, 5);
        let expected = concat!(
            "Plot: 2020-01-01..2020-02-01 | price=[0.95, 2.05]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn cutoff_column_does_not_overwrite_line() {
        let fc = flat_forecast(&[d(2020, 1, 1), d(2020, 2, 1)], 1.0);
        let txt = render_forecast_plot(&observations(), &fc, Some(d(2020, 1, 16)), 10, 5);
        let expected = concat!(
            "Plot: 2020-01-01..2020-02-01 | price=[0.95, 2.05]\n",
            "    |    o\n",
            "    |     \n",
            "    |     \n",
            "    |     \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_inputs_do_not_panic() {
        let txt = render_forecast_plot(&[], &Forecast::default(), None, 10, 5);
        assert_eq!(txt, "Plot: nothing to draw\n");
    }
}
