//! Dashboard screen: live readings, ventilation verdict, controller
//! health, weather and active incidents on one page.

use chrono::Utc;
use color_eyre::eyre::Result;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use strum::IntoEnumIterator;

use ventwatch_core::{
    Dashboard, DeviceStatus, Incident, Snapshot, TemperatureUnit, VentilationAssessment, Zone,
    active_incidents, assess_ventilation,
};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::fmt;

pub struct DashboardScreen {
    focused: bool,
    units: TemperatureUnit,
    status: Option<Snapshot<DeviceStatus>>,
    dashboard: Option<Snapshot<Dashboard>>,
}

/// The status endpoint wins; the dashboard's embedded status is the
/// fallback. Returns the status and whether it is stale.
fn pick_status<'a>(
    status: Option<&'a Snapshot<DeviceStatus>>,
    dashboard: Option<&'a Snapshot<Dashboard>>,
) -> Option<(&'a DeviceStatus, bool)> {
    if let Some(s) = status {
        return Some((s.data.as_ref(), s.stale));
    }
    let d = dashboard?;
    d.data.status.as_ref().map(|s| (s, d.stale))
}

/// Active incidents, worst first.
fn ranked_active(incidents: &[Incident]) -> Vec<Incident> {
    let mut active = active_incidents(incidents);
    active.sort_by(|a, b| b.severity.cmp(&a.severity).then(b.started_at.cmp(&a.started_at)));
    active
}

fn panel(title: &str, stale: bool) -> Block<'static> {
    let title = if stale {
        format!(" {title} (stale) ")
    } else {
        format!(" {title} ")
    };
    Block::default()
        .title(title)
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default())
}

fn field<'a>(label: &'a str, value: impl Into<Span<'a>>) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {label:<10} "), theme::key_hint()),
        value.into(),
    ])
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            units: TemperatureUnit::default(),
            status: None,
            dashboard: None,
        }
    }

    fn current(&self) -> Option<(&DeviceStatus, bool)> {
        pick_status(self.status.as_ref(), self.dashboard.as_ref())
    }

    fn assessment(&self) -> VentilationAssessment {
        match self.current() {
            Some((s, _)) => assess_ventilation(
                &s.reading(Zone::Indoor),
                &s.reading(Zone::Outdoor),
                s.system.fan_on,
            ),
            None => assess_ventilation(&Default::default(), &Default::default(), None),
        }
    }

    fn render_zone(&self, frame: &mut Frame, area: Rect, zone: Zone, color_idx: usize) {
        let current = self.current();
        let stale = current.is_some_and(|(_, stale)| stale);
        let block = panel(&zone.to_string(), stale);

        let reading = current.map(|(s, _)| s.reading(zone)).unwrap_or_default();
        if reading.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(Paragraph::new(" No reading").style(theme::muted()), inner);
            return;
        }

        let color = theme::ZONE_SERIES
            .get(color_idx)
            .copied()
            .unwrap_or(theme::DIM_WHITE);
        let lines = vec![
            Line::from(Span::styled(
                format!(" {}", self.units.format(reading.temperature_c)),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            field("Humidity", fmt::fmt_pct(reading.humidity_pct)),
            field("Pressure", fmt::fmt_hpa(reading.pressure_hpa)),
        ];
        frame.render_widget(
            Paragraph::new(lines).style(theme::value_style(stale)).block(block),
            area,
        );
    }

    fn render_ventilation(&self, frame: &mut Frame, area: Rect) {
        let assessment = self.assessment();
        let color = theme::verdict_color(assessment.verdict);

        let score = match (assessment.score, assessment.rating) {
            (Some(score), Some(rating)) => format!("{score:.0}/100 ({rating})"),
            _ => fmt::MISSING.into(),
        };
        let fan = self.current().and_then(|(s, _)| s.system.fan_on);
        let fan = match fan {
            Some(true) => Span::styled("on", Style::default().fg(theme::SUCCESS_GREEN)),
            Some(false) => Span::styled("off", theme::table_row()),
            None => Span::styled(fmt::MISSING, theme::muted()),
        };

        let lines = vec![
            Line::from(Span::styled(
                format!(" {}", assessment.verdict),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!(" {}", assessment.headline(self.units)),
                Style::default().fg(color),
            )),
            Line::from(""),
            field("Fan", fan),
            field("Score", score),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(panel("Ventilation", false)),
            area,
        );
    }

    fn render_system(&self, frame: &mut Frame, area: Rect) {
        let Some((status, stale)) = self.current() else {
            let block = panel("Controller", false);
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(Paragraph::new(" No status yet").style(theme::muted()), inner);
            return;
        };
        let sys = &status.system;

        let boot = match sys.boot_reason {
            Some(ref reason) if reason.is_abnormal() => {
                Span::styled(reason.to_string(), Style::default().fg(theme::ERROR_RED))
            }
            Some(ref reason) => Span::raw(reason.to_string()),
            None => Span::styled(fmt::MISSING, theme::muted()),
        };
        let reported = status
            .reported_at
            .map_or_else(|| fmt::MISSING.into(), |t| fmt::fmt_age(t, Utc::now()));

        let lines = vec![
            field("Device", status.device_id.clone().unwrap_or_else(|| fmt::MISSING.into())),
            field("Uptime", fmt::fmt_uptime(sys.uptime)),
            field("Free heap", fmt::fmt_heap(sys.free_heap_bytes)),
            field("Boot", boot),
            field("Wi-Fi", fmt::signal_span(sys.wifi_rssi_dbm)),
            field("Reported", reported),
        ];
        frame.render_widget(
            Paragraph::new(lines)
                .style(theme::value_style(stale))
                .block(panel("Controller", stale)),
            area,
        );
    }

    fn render_weather(&self, frame: &mut Frame, area: Rect) {
        let stale = self.dashboard.as_ref().is_some_and(|d| d.stale);
        let block = panel("Weather", stale);
        let weather = self
            .dashboard
            .as_ref()
            .and_then(|d| d.data.weather.as_ref());
        let Some(w) = weather else {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(Paragraph::new(" No weather data").style(theme::muted()), inner);
            return;
        };

        let mut lines = vec![
            field(
                "Now",
                w.description.clone().unwrap_or_else(|| fmt::MISSING.into()),
            ),
            field("Temp", self.units.format(w.temperature_c)),
            field("Humidity", fmt::fmt_pct(w.humidity_pct)),
            field("Rain", fmt::fmt_pct(w.precipitation_probability_pct)),
            field(
                "Storm",
                Span::styled(
                    w.storm_risk.to_string(),
                    Style::default().fg(theme::storm_color(w.storm_risk)),
                ),
            ),
        ];
        let next = self
            .dashboard
            .as_ref()
            .and_then(|d| d.data.forecast.iter().find(|p| p.time > Utc::now()));
        if let Some(p) = next {
            lines.push(field(
                "Next",
                format!(
                    "{} {}",
                    fmt::fmt_clock(Some(p.time)),
                    self.units.format(p.temperature_c)
                ),
            ));
        }
        frame.render_widget(
            Paragraph::new(lines).style(theme::value_style(stale)).block(block),
            area,
        );
    }

    fn render_incidents(&self, frame: &mut Frame, area: Rect) {
        let stale = self.dashboard.as_ref().is_some_and(|d| d.stale);
        let block = panel("Active incidents", stale);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(ref dashboard) = self.dashboard else {
            frame.render_widget(Paragraph::new(" No data").style(theme::muted()), inner);
            return;
        };
        let active = ranked_active(&dashboard.data.incidents);
        if active.is_empty() {
            frame.render_widget(
                Paragraph::new(" All clear").style(Style::default().fg(theme::SUCCESS_GREEN)),
                inner,
            );
            return;
        }

        let now = Utc::now();
        let lines: Vec<Line> = active
            .iter()
            .take(usize::from(inner.height))
            .map(|i| {
                let color = theme::severity_color(i.severity);
                let since = i
                    .duration(now)
                    .map(|d| format!("  for {}", fmt::fmt_span(d)))
                    .unwrap_or_default();
                Line::from(vec![
                    Span::styled(" ● ", Style::default().fg(color)),
                    Span::styled(format!("{:<9}", i.severity), Style::default().fg(color)),
                    Span::styled(i.title(), theme::table_row()),
                    Span::styled(since, theme::key_hint()),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Component for DashboardScreen {
    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::StatusUpdated(snap) => self.status = Some(snap.clone()),
            Action::DashboardUpdated(snap) => self.dashboard = Some(snap.clone()),
            Action::UnitsChanged(units) => self.units = *units,
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Dashboard ")
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

        let rows = Layout::vertical([
            Constraint::Length(5), // zone cards
            Constraint::Length(8), // ventilation | controller | weather
            Constraint::Min(3),    // incidents
        ])
        .split(inner);

        let zones = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(rows[0]);
        for (i, (zone, area)) in Zone::iter().zip(zones.iter()).enumerate() {
            self.render_zone(frame, *area, zone, i);
        }

        let middle = Layout::horizontal([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(rows[1]);
        self.render_ventilation(frame, middle[0]);
        self.render_system(frame, middle[1]);
        self.render_weather(frame, middle[2]);

        self.render_incidents(frame, rows[2]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &'static str {
        "Dashboard"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use ventwatch_core::{IncidentEnd, Severity};

    use super::*;

    fn snap<T>(data: T, stale: bool) -> Snapshot<T> {
        Snapshot {
            data: Arc::new(data),
            fetched_at: Utc::now(),
            stale,
        }
    }

    fn status(id: &str) -> DeviceStatus {
        DeviceStatus {
            device_id: Some(id.into()),
            ..DeviceStatus::default()
        }
    }

    #[test]
    fn status_endpoint_wins_over_dashboard_copy() {
        let direct = snap(status("direct"), false);
        let dash = snap(
            Dashboard {
                status: Some(status("embedded")),
                ..Dashboard::default()
            },
            true,
        );

        let (s, stale) = pick_status(Some(&direct), Some(&dash)).unwrap();
        assert_eq!(s.device_id.as_deref(), Some("direct"));
        assert!(!stale);

        let (s, stale) = pick_status(None, Some(&dash)).unwrap();
        assert_eq!(s.device_id.as_deref(), Some("embedded"));
        assert!(stale);

        assert!(pick_status(None, None).is_none());
    }

    #[test]
    fn active_incidents_are_ranked_worst_first() {
        let at = |h| Utc.with_ymd_and_hms(2026, 10, 16, h, 0, 0).single();
        let incident = |kind: &str, severity, started, ended: Option<chrono::DateTime<Utc>>| {
            Incident {
                kind: kind.into(),
                severity,
                started_at: at(started),
                end: ended.map_or(IncidentEnd::Ongoing, IncidentEnd::At),
                description: None,
            }
        };
        let incidents = vec![
            incident("sensor_drift", Severity::Warning, 9, None),
            incident("fan_stuck", Severity::Major, 8, None),
            incident("wifi_drop", Severity::Critical, 7, at(8)),
            incident("door_open", Severity::Warning, 10, None),
        ];

        let kinds: Vec<String> = ranked_active(&incidents).into_iter().map(|i| i.kind).collect();
        assert_eq!(kinds, ["fan_stuck", "door_open", "sensor_drift"]);
    }
}
