//! History screen: per-zone line chart over a selectable window.

use chrono::{DateTime, Local};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, Paragraph};
use strum::IntoEnumIterator;

use ventwatch_core::{
    HistoryPoint, HistoryRange, HistorySeries, Metric, Snapshot, TemperatureUnit, Zone,
    chart_series,
};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::sub_tabs;

const RANGE_LABELS: [&str; 4] = ["1h", "6h", "24h", "7d"];

pub struct HistoryScreen {
    focused: bool,
    units: TemperatureUnit,
    range: HistoryRange,
    metric: Metric,
    history: Option<Snapshot<HistorySeries>>,
}

fn range_index(range: HistoryRange) -> usize {
    match range {
        HistoryRange::OneHour => 0,
        HistoryRange::SixHours => 1,
        HistoryRange::Day => 2,
        HistoryRange::Week => 3,
    }
}

fn range_for_key(c: char) -> Option<HistoryRange> {
    match c {
        'h' => Some(HistoryRange::OneHour),
        's' => Some(HistoryRange::SixHours),
        'd' => Some(HistoryRange::Day),
        'w' => Some(HistoryRange::Week),
        _ => None,
    }
}

fn next_metric(metric: Metric) -> Metric {
    match metric {
        Metric::Temperature => Metric::Humidity,
        Metric::Humidity => Metric::Pressure,
        Metric::Pressure => Metric::Temperature,
    }
}

fn metric_suffix(metric: Metric, units: TemperatureUnit) -> &'static str {
    match metric {
        Metric::Temperature => units.symbol(),
        Metric::Humidity => "%",
        Metric::Pressure => " hPa",
    }
}

/// Y-axis bounds with 10% headroom; flat series get a span of 1.
fn y_bounds<'a>(values: impl Iterator<Item = &'a f64>) -> [f64; 2] {
    let (lo, hi) = values.fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo) * 0.1).max(0.5);
    [lo - pad, hi + pad]
}

/// Share of samples with the fan reported on, ignoring unknown samples.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn fan_duty(points: &[HistoryPoint]) -> Option<f64> {
    let known: Vec<bool> = points.iter().filter_map(|p| p.fan_on).collect();
    if known.is_empty() {
        return None;
    }
    let on = known.iter().filter(|&&on| on).count();
    Some(on as f64 / known.len() as f64 * 100.0)
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn time_label(secs: f64, range: HistoryRange) -> String {
    let Some(ts) = DateTime::from_timestamp(secs as i64, 0) else {
        return String::new();
    };
    let local = ts.with_timezone(&Local);
    match range {
        HistoryRange::Week => local.format("%m-%d").to_string(),
        _ => local.format("%H:%M").to_string(),
    }
}

impl HistoryScreen {
    pub fn new(range: HistoryRange) -> Self {
        Self {
            focused: false,
            units: TemperatureUnit::default(),
            range,
            metric: Metric::Temperature,
            history: None,
        }
    }

    /// The snapshot on hand belongs to a different range than the one
    /// selected; a fetch is in flight.
    fn is_pending(&self) -> bool {
        self.history
            .as_ref()
            .is_some_and(|h| h.data.range != self.range)
    }

    fn render_chart(&self, frame: &mut Frame, area: Rect) {
        let mut title = format!(" {} · {} ", self.metric, self.range.label());
        if self.is_pending() {
            title.push_str("(loading) ");
        } else if self.history.as_ref().is_some_and(|h| h.stale) {
            title.push_str("(stale) ");
        }
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());

        let points = self
            .history
            .as_ref()
            .map_or(&[][..], |h| h.data.points.as_slice());
        let series: Vec<(Zone, Vec<(f64, f64)>)> = Zone::iter()
            .map(|zone| (zone, chart_series(points, zone, self.metric, self.units)))
            .filter(|(_, data)| !data.is_empty())
            .collect();

        if series.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(Paragraph::new("  No data").style(theme::muted()), inner);
            return;
        }

        let xs = || series.iter().flat_map(|(_, d)| d.iter().map(|(x, _)| x));
        let x_min = xs().copied().fold(f64::MAX, f64::min);
        let x_max = xs().copied().fold(f64::MIN, f64::max).max(x_min + 1.0);
        let [y_min, y_max] = y_bounds(series.iter().flat_map(|(_, d)| d.iter().map(|(_, y)| y)));

        let datasets: Vec<Dataset> = series
            .iter()
            .enumerate()
            .map(|(i, (zone, data))| {
                let color = theme::ZONE_SERIES
                    .get(i)
                    .copied()
                    .unwrap_or(theme::DIM_WHITE);
                Dataset::default()
                    .name(zone.to_string())
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(color))
                    .data(data)
            })
            .collect();

        let axis_style = Style::default().fg(theme::BORDER_GRAY);
        let suffix = metric_suffix(self.metric, self.units);
        let x_labels = vec![
            Span::styled(time_label(x_min, self.range), axis_style),
            Span::styled(time_label(f64::midpoint(x_min, x_max), self.range), axis_style),
            Span::styled(time_label(x_max, self.range), axis_style),
        ];
        let y_labels = vec![
            Span::styled(format!("{y_min:.1}{suffix}"), axis_style),
            Span::styled(format!("{:.1}{suffix}", f64::midpoint(y_min, y_max)), axis_style),
            Span::styled(format!("{y_max:.1}{suffix}"), axis_style),
        ];

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .bounds([x_min, x_max])
                    .labels(x_labels)
                    .style(axis_style),
            )
            .y_axis(
                Axis::default()
                    .bounds([y_min, y_max])
                    .labels(y_labels)
                    .style(axis_style),
            );
        frame.render_widget(chart, area);
    }

    fn summary_line(&self) -> Line<'static> {
        let Some(ref history) = self.history else {
            return Line::from(Span::styled("  Waiting for history…", theme::muted()));
        };
        let data = &history.data;
        let mut spans = vec![Span::styled(
            format!("  {} samples", data.points.len()),
            theme::table_row(),
        )];
        if let Some(duty) = fan_duty(&data.points) {
            spans.push(Span::styled(format!("  fan on {duty:.0}%"), theme::table_row()));
        }
        if data.rejected > 0 {
            spans.push(Span::styled(
                format!("  {} samples dropped (bad timestamp)", data.rejected),
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ));
        }
        Line::from(spans)
    }
}

impl Component for HistoryScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char(c) => {
                if let Some(range) = range_for_key(c) {
                    self.range = range;
                    return Ok(Some(Action::SelectHistoryRange(range)));
                }
                if c == 'm' {
                    self.metric = next_metric(self.metric);
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::HistoryUpdated(snap) => self.history = Some(snap.clone()),
            Action::SelectHistoryRange(range) => self.range = *range,
            Action::UnitsChanged(units) => self.units = *units,
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" History ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([
            Constraint::Length(1), // range selector
            Constraint::Min(6),    // chart
            Constraint::Length(1), // summary
            Constraint::Length(1), // hints
        ])
        .split(inner);

        let selector = sub_tabs::render_sub_tabs(&RANGE_LABELS, range_index(self.range));
        frame.render_widget(Paragraph::new(selector), layout[0]);

        self.render_chart(frame, layout[1]);
        frame.render_widget(Paragraph::new(self.summary_line()), layout[2]);

        let hints = sub_tabs::render_hints(&[
            ("h", "1h"),
            ("s", "6h"),
            ("d", "24h"),
            ("w", "7d"),
            ("m", "metric"),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[3]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &'static str {
        "History"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use ventwatch_core::SensorReading;

    use super::*;

    fn point(fan_on: Option<bool>) -> HistoryPoint {
        HistoryPoint {
            timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap(),
            indoor: SensorReading::default(),
            outdoor: SensorReading::default(),
            garage: SensorReading::default(),
            fan_on,
        }
    }

    #[test]
    fn range_keys_match_selector_order() {
        let keys = ['h', 's', 'd', 'w'];
        for (i, key) in keys.into_iter().enumerate() {
            let range = range_for_key(key).unwrap();
            assert_eq!(range_index(range), i);
            assert_eq!(RANGE_LABELS[i], range.to_string());
        }
        assert_eq!(range_for_key('x'), None);
    }

    #[test]
    fn bounds_pad_and_handle_flat_or_empty_series() {
        assert_eq!(y_bounds([].iter()), [0.0, 1.0]);
        assert_eq!(y_bounds([20.0].iter()), [19.5, 20.5]);
        assert_eq!(y_bounds([10.0, 30.0].iter()), [8.0, 32.0]);
    }

    #[test]
    fn fan_duty_ignores_unknown_samples() {
        let points = [point(Some(true)), point(Some(false)), point(None), point(Some(true))];
        let duty = fan_duty(&points).unwrap();
        assert!((duty - 66.666).abs() < 0.01, "{duty}");
        assert_eq!(fan_duty(&[point(None)]), None);
    }

    #[test]
    fn pending_while_other_range_is_on_screen() {
        let mut screen = HistoryScreen::new(HistoryRange::Day);
        screen
            .update(&Action::HistoryUpdated(Snapshot {
                data: std::sync::Arc::new(HistorySeries {
                    range: HistoryRange::Day,
                    points: Vec::new(),
                    rejected: 0,
                }),
                fetched_at: Utc::now(),
                stale: false,
            }))
            .unwrap();
        assert!(!screen.is_pending());

        let action = screen
            .handle_key_event(KeyEvent::from(KeyCode::Char('w')))
            .unwrap();
        assert!(matches!(action, Some(Action::SelectHistoryRange(HistoryRange::Week))));
        assert!(screen.is_pending());
    }
}
