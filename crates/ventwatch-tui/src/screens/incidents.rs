//! Incidents screen: filterable incident log with a detail pane.

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

use ventwatch_core::{Incident, IncidentLog, Severity, Snapshot, filter_by_min_severity};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::{fmt, sub_tabs};

const SEVERITY_LABELS: [&str; 4] = ["0 info+", "1 warning+", "2 major+", "3 critical"];

pub struct IncidentsScreen {
    focused: bool,
    log: Option<Snapshot<IncidentLog>>,
    min_severity: Severity,
    active_only: bool,
    table_state: TableState,
}

/// Incidents at or above `min`, optionally only open ones. Open incidents
/// come first, then newest first.
fn visible(incidents: &[Incident], min: Severity, active_only: bool) -> Vec<Incident> {
    let mut shown: Vec<Incident> = filter_by_min_severity(incidents, min)
        .into_iter()
        .filter(|i| !active_only || i.is_active())
        .collect();
    shown.sort_by(|a, b| {
        b.is_active()
            .cmp(&a.is_active())
            .then(b.started_at.cmp(&a.started_at))
    });
    shown
}

impl IncidentsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            log: None,
            min_severity: Severity::Info,
            active_only: false,
            table_state: TableState::default().with_selected(Some(0)),
        }
    }

    fn rows(&self) -> Vec<Incident> {
        self.log.as_ref().map_or_else(Vec::new, |log| {
            visible(&log.data.incidents, self.min_severity, self.active_only)
        })
    }

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        let idx = self.selected_index().min(len.saturating_sub(1));
        self.table_state.select(Some(idx));
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let idx = self.selected_index();
        let next = if down {
            (idx + 1).min(len - 1)
        } else {
            idx.saturating_sub(1)
        };
        self.table_state.select(Some(next));
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, rows: &[Incident]) {
        let hours = self.log.as_ref().map_or(0, |l| l.data.hours);
        let stale = self.log.as_ref().is_some_and(|l| l.stale);
        let title = format!(
            " Last {hours}h · {} shown{} ",
            rows.len(),
            if stale { " (stale)" } else { "" }
        );
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());

        if rows.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let text = if self.log.is_some() {
                "  No incidents match the filter"
            } else {
                "  No data"
            };
            frame.render_widget(Paragraph::new(text).style(theme::muted()), inner);
            return;
        }

        let header = Row::new(
            ["Severity", "Incident", "Started", "Ended", "Duration"]
                .map(|h| Cell::from(h).style(theme::table_header())),
        );

        let now = Utc::now();
        let selected = self.selected_index();
        let table_rows: Vec<Row> = rows
            .iter()
            .enumerate()
            .map(|(i, incident)| {
                let prefix = if i == selected { "▸" } else { " " };
                let color = theme::severity_color(incident.severity);
                let ended = if incident.is_active() {
                    Span::styled("ongoing", Style::default().fg(theme::ELECTRIC_YELLOW))
                } else {
                    Span::raw(fmt::fmt_clock(incident.ended_at()))
                };
                Row::new(vec![
                    Cell::from(format!("{prefix} {}", incident.severity))
                        .style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
                    Cell::from(incident.title()),
                    Cell::from(fmt::fmt_clock(incident.started_at)),
                    Cell::from(ended),
                    Cell::from(
                        incident
                            .duration(now)
                            .map_or_else(|| fmt::MISSING.into(), fmt::fmt_span),
                    ),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Length(11),
            Constraint::Fill(1),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(9),
        ];
        let table = Table::new(table_rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state;
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_detail(frame: &mut Frame, area: Rect, incident: Option<&Incident>) {
        let block = Block::default()
            .title(" Details ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let text = incident
            .and_then(|i| i.description.clone())
            .unwrap_or_else(|| "No description".into());
        frame.render_widget(
            Paragraph::new(text)
                .style(theme::table_row())
                .wrap(Wrap { trim: true })
                .block(block),
            area,
        );
    }
}

impl Component for IncidentsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char(c @ '0'..='3') => {
                let level = c.to_digit(10).map_or(0, i64::from);
                Ok(Some(Action::SetMinSeverity(Severity::from_level(level))))
            }
            KeyCode::Char('a') => Ok(Some(Action::ToggleActiveOnly)),
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(true);
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(false);
                Ok(None)
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.table_state.select(Some(0));
                Ok(None)
            }
            KeyCode::Char('G') | KeyCode::End => {
                let last = self.rows().len().saturating_sub(1);
                self.table_state.select(Some(last));
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::IncidentsUpdated(snap) => {
                self.log = Some(snap.clone());
                self.clamp_selection();
            }
            Action::SetMinSeverity(min) => {
                self.min_severity = *min;
                self.table_state.select(Some(0));
            }
            Action::ToggleActiveOnly => {
                self.active_only = !self.active_only;
                self.table_state.select(Some(0));
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Incidents ")
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
            Constraint::Length(1), // severity selector
            Constraint::Min(5),    // table
            Constraint::Length(5), // details
            Constraint::Length(1), // hints
        ])
        .split(inner);

        let mut selector = sub_tabs::render_sub_tabs(
            &SEVERITY_LABELS,
            usize::from(self.min_severity.level()),
        );
        let scope = if self.active_only {
            Span::styled("    active only", theme::tab_active())
        } else {
            Span::styled("    all", theme::tab_inactive())
        };
        selector.spans.push(scope);
        frame.render_widget(Paragraph::new(selector), layout[0]);

        let rows = self.rows();
        self.render_table(frame, layout[1], &rows);
        Self::render_detail(frame, layout[2], rows.get(self.selected_index()));

        let hints = sub_tabs::render_hints(&[
            ("0-3", "min severity"),
            ("a", "active only"),
            ("j/k", "select"),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[3]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &'static str {
        "Incidents"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, TimeZone};
    use pretty_assertions::assert_eq;
    use ventwatch_core::IncidentEnd;

    use super::*;

    fn at(hour: u32) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(2026, 10, 16, hour, 0, 0).single()
    }

    fn incident(kind: &str, severity: Severity, start: u32, end: Option<u32>) -> Incident {
        Incident {
            kind: kind.into(),
            severity,
            started_at: at(start),
            end: end.and_then(at).map_or(IncidentEnd::Ongoing, IncidentEnd::At),
            description: None,
        }
    }

    fn sample() -> Vec<Incident> {
        vec![
            incident("sensor_drift", Severity::Info, 6, Some(7)),
            incident("fan_stuck", Severity::Major, 8, None),
            incident("wifi_drop", Severity::Warning, 9, Some(10)),
            incident("overheat", Severity::Critical, 5, None),
        ]
    }

    fn kinds(incidents: &[Incident]) -> Vec<&str> {
        incidents.iter().map(|i| i.kind.as_str()).collect()
    }

    #[test]
    fn open_incidents_lead_then_newest_first() {
        let shown = visible(&sample(), Severity::Info, false);
        assert_eq!(
            kinds(&shown),
            ["fan_stuck", "overheat", "wifi_drop", "sensor_drift"]
        );
    }

    #[test]
    fn severity_floor_and_active_filter_combine() {
        let shown = visible(&sample(), Severity::Warning, false);
        assert_eq!(kinds(&shown), ["fan_stuck", "overheat", "wifi_drop"]);

        let shown = visible(&sample(), Severity::Major, true);
        assert_eq!(kinds(&shown), ["fan_stuck", "overheat"]);

        let shown = visible(&sample(), Severity::Critical, true);
        assert_eq!(kinds(&shown), ["overheat"]);
    }

    #[test]
    fn digit_keys_request_a_severity_floor() {
        let mut screen = IncidentsScreen::new();
        let action = screen
            .handle_key_event(KeyEvent::from(KeyCode::Char('2')))
            .unwrap();
        assert!(matches!(action, Some(Action::SetMinSeverity(Severity::Major))));

        screen.update(&action.unwrap()).unwrap();
        screen.update(&Action::ToggleActiveOnly).unwrap();
        assert_eq!(screen.min_severity, Severity::Major);
        assert!(screen.active_only);
    }
}
