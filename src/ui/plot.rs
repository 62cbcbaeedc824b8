use std::ops::RangeInclusive;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, HLine, Legend, Line, Plot, PlotPoint, PlotPoints};

use crate::color::{generate_palette, SignPalette};
use crate::data::model::Series;
use crate::data::time::{axis_to_date, date_to_axis, month_label};
use crate::data::transform::sign_split;
use crate::state::{AppState, ChartMode};

/// Bar width used when the spacing cannot be inferred (monthly data).
const DEFAULT_BAR_WIDTH: f64 = 1.0 / 12.0;

// ---------------------------------------------------------------------------
// Index chart (central panel)
// ---------------------------------------------------------------------------

/// Render the chart for the selected index in the central panel.
pub fn index_plot(ui: &mut Ui, state: &AppState) {
    let Some(series) = state.visible_series() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No index data loaded  (File → Open dataset folder…)");
        });
        return;
    };

    let period = series
        .time_range()
        .map(|(a, b)| format!("{} – {}", month_label(a), month_label(b)))
        .unwrap_or_else(|| "no observations in the selected period".to_string());
    ui.heading(format!("{}  ({period})", series.name));

    match state.chart_mode {
        ChartMode::Bars => bar_plot(ui, &series),
        ChartMode::Lines => line_plot(ui, &series, &state.visible_overlays()),
    }
}

fn hover_label(name: &str, point: &PlotPoint) -> String {
    let date = axis_to_date(point.x).map(month_label).unwrap_or_default();
    if name.is_empty() {
        format!("Date: {date}\nValue: {:.2}", point.y)
    } else {
        format!("{name}\nDate: {date}\nValue: {:.2}", point.y)
    }
}

/// Whole years on coarse grids, `Mon YYYY` once the grid gets finer than a year.
fn format_axis(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    if mark.step_size >= 1.0 {
        format!("{:.0}", mark.value)
    } else {
        axis_to_date(mark.value).map(month_label).unwrap_or_default()
    }
}

/// Bar width in axis units: the median spacing between observations.
pub fn bar_width(series: &Series) -> f64 {
    let xs: Vec<f64> = series
        .observations()
        .iter()
        .map(|o| date_to_axis(o.time))
        .collect();
    let mut gaps: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    if gaps.is_empty() {
        return DEFAULT_BAR_WIDTH;
    }
    gaps.sort_by(f64::total_cmp);
    gaps[gaps.len() / 2]
}

/// Anomaly bars: positive part in red, negative part in blue, no gap between bars.
fn bar_plot(ui: &mut Ui, series: &Series) {
    let split = sign_split(series);
    let width = bar_width(series);
    let colors = SignPalette::default();

    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for (i, time) in split.times.iter().enumerate() {
        let x = date_to_axis(*time);
        if let Some(p) = split.positive[i].filter(|p| *p > 0.0) {
            positive.push(Bar::new(x, p).width(width));
        }
        if let Some(n) = split.negative[i].filter(|n| *n < 0.0) {
            negative.push(Bar::new(x, n).width(width));
        }
    }

    let hover = |bar: &Bar, _chart: &BarChart| {
        let date = axis_to_date(bar.argument)
            .map(month_label)
            .unwrap_or_default();
        format!("Date: {date}\nValue: {:.2}", bar.value)
    };

    Plot::new("index_bars")
        .x_axis_label("Date")
        .y_axis_label(series.name.as_str())
        .x_axis_formatter(format_axis)
        .label_formatter(hover_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.hline(HLine::new(0.0).color(Color32::GRAY).width(1.0));
            plot_ui.bar_chart(
                BarChart::new(positive)
                    .color(colors.positive)
                    .element_formatter(Box::new(hover)),
            );
            plot_ui.bar_chart(
                BarChart::new(negative)
                    .color(colors.negative)
                    .element_formatter(Box::new(hover)),
            );
        });
}

/// Split a series into runs of present values so gaps stay visible.
pub fn line_segments(series: &Series) -> Vec<Vec<[f64; 2]>> {
    let mut segments = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for obs in series.observations() {
        match obs.value {
            Some(v) => current.push([date_to_axis(obs.time), v]),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// The selected index plus overlays as lines, one palette colour each.
fn line_plot(ui: &mut Ui, series: &Series, overlays: &[Series]) {
    let colors = generate_palette(overlays.len() + 1);

    Plot::new("index_lines")
        .legend(Legend::default())
        .x_axis_label("Date")
        .y_axis_label(series.name.as_str())
        .x_axis_formatter(format_axis)
        .label_formatter(hover_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.hline(HLine::new(0.0).color(Color32::GRAY).width(1.0));
            for (s, color) in std::iter::once(series).chain(overlays).zip(colors) {
                for segment in line_segments(s) {
                    let points: PlotPoints = segment.into();
                    plot_ui.line(Line::new(points).name(&s.name).color(color).width(1.5));
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::Observation;

    fn monthly(values: &[Option<f64>]) -> Series {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let d = NaiveDate::from_ymd_opt(1990 + (i / 12) as i32, (i % 12) as u32 + 1, 1)
                    .unwrap();
                Observation::new(d, *v)
            })
            .collect();
        Series::from_unsorted("NINO3", rows)
    }

    #[test]
    fn bar_width_tracks_monthly_spacing() {
        let s = monthly(&[Some(1.0); 24]);
        assert!((bar_width(&s) - 1.0 / 12.0).abs() < 0.01);
        assert_eq!(bar_width(&monthly(&[Some(1.0)])), DEFAULT_BAR_WIDTH);
    }

    #[test]
    fn segments_break_on_missing() {
        let s = monthly(&[None, Some(1.0), Some(2.0), None, None, Some(3.0)]);
        let segments = line_segments(&s);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1][0][1], 3.0);
        assert!(line_segments(&monthly(&[None, None])).is_empty());
    }
}
