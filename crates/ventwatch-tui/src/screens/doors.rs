//! Doors screen: per-door roll-up above a scrollable event log.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use ventwatch_core::{DoorActivity, DoorEvent, DoorSummary, Snapshot, summarize_doors};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::{fmt, sub_tabs};

/// Window choices cycled with `w`, in days.
const WINDOWS: [u32; 4] = [1, 7, 14, 30];
const WINDOW_LABELS: [&str; 4] = ["1d", "7d", "14d", "30d"];

pub struct DoorsScreen {
    focused: bool,
    days: u32,
    activity: Option<Snapshot<DoorActivity>>,
    table_state: TableState,
}

fn next_window(days: u32) -> u32 {
    WINDOWS
        .iter()
        .copied()
        .find(|&w| w > days)
        .unwrap_or(WINDOWS[0])
}

/// Timestamped events newest first; undated events sink to the bottom.
fn newest_first(events: &[DoorEvent]) -> Vec<&DoorEvent> {
    let mut sorted: Vec<&DoorEvent> = events.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
}

fn fmt_confidence(c: Option<f64>) -> String {
    fmt::fmt_pct(c.map(|c| c * 100.0))
}

fn state_span(opened: Option<bool>) -> Span<'static> {
    match opened {
        Some(true) => Span::styled("open", Style::default().fg(theme::ELECTRIC_YELLOW)),
        Some(false) => Span::styled("closed", Style::default().fg(theme::SUCCESS_GREEN)),
        None => Span::styled(fmt::MISSING, theme::muted()),
    }
}

fn panel(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default())
}

impl DoorsScreen {
    pub fn new(days: u32) -> Self {
        Self {
            focused: false,
            days,
            activity: None,
            table_state: TableState::default().with_selected(Some(0)),
        }
    }

    fn events(&self) -> Vec<&DoorEvent> {
        self.activity
            .as_ref()
            .map_or_else(Vec::new, |a| newest_first(&a.data.events))
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.events().len();
        if len == 0 {
            return;
        }
        let idx = self.table_state.selected().unwrap_or(0);
        let next = if down {
            (idx + 1).min(len - 1)
        } else {
            idx.saturating_sub(1)
        };
        self.table_state.select(Some(next));
    }

    fn render_summary(frame: &mut Frame, area: Rect, summary: &[DoorSummary]) {
        let block = panel(" By door ".into());
        if summary.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(Paragraph::new("  No door activity").style(theme::muted()), inner);
            return;
        }

        let header = Row::new(
            ["Door", "State", "Opens", "Closes", "Last event", "Confidence"]
                .map(|h| Cell::from(h).style(theme::table_header())),
        );
        let rows: Vec<Row> = summary
            .iter()
            .map(|s| {
                Row::new(vec![
                    Cell::from(s.door_name.clone()),
                    Cell::from(state_span(s.last_opened)),
                    Cell::from(s.opens.to_string()),
                    Cell::from(s.closes.to_string()),
                    Cell::from(fmt::fmt_clock(s.last_event_at)),
                    Cell::from(fmt_confidence(s.mean_confidence)),
                ])
                .style(theme::table_row())
            })
            .collect();
        let widths = [
            Constraint::Fill(1),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(12),
            Constraint::Length(10),
        ];
        frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
    }

    fn render_events(&self, frame: &mut Frame, area: Rect, events: &[&DoorEvent]) {
        let stale = self.activity.as_ref().is_some_and(|a| a.stale);
        let block = panel(format!(
            " Events · {}{} ",
            events.len(),
            if stale { " (stale)" } else { "" }
        ));
        if events.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let text = if self.activity.is_some() {
                "  No events in this window"
            } else {
                "  No data"
            };
            frame.render_widget(Paragraph::new(text).style(theme::muted()), inner);
            return;
        }

        let header = Row::new(
            ["Time", "Door", "Event", "Detected by", "Confidence"]
                .map(|h| Cell::from(h).style(theme::table_header())),
        );
        let rows: Vec<Row> = events
            .iter()
            .map(|e| {
                Row::new(vec![
                    Cell::from(fmt::fmt_clock(e.timestamp)),
                    Cell::from(e.door_name.clone()),
                    Cell::from(state_span(Some(e.opened))),
                    Cell::from(
                        e.detection_method
                            .as_ref()
                            .map_or_else(|| fmt::MISSING.into(), ToString::to_string),
                    ),
                    Cell::from(fmt_confidence(e.confidence)),
                ])
                .style(theme::table_row())
            })
            .collect();
        let widths = [
            Constraint::Length(12),
            Constraint::Fill(1),
            Constraint::Length(7),
            Constraint::Length(12),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state;
        frame.render_stateful_widget(table, area, &mut state);
    }
}

impl Component for DoorsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('w') => Ok(Some(Action::SelectDoorWindow(next_window(self.days)))),
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(true);
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(false);
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::DoorsUpdated(snap) => {
                self.activity = Some(snap.clone());
                let last = self.events().len().saturating_sub(1);
                let idx = self.table_state.selected().unwrap_or(0).min(last);
                self.table_state.select(Some(idx));
            }
            Action::SelectDoorWindow(days) => {
                self.days = *days;
                self.table_state.select(Some(0));
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Doors ")
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

        let summary = self
            .activity
            .as_ref()
            .map_or_else(Vec::new, |a| summarize_doors(&a.data.events));
        let events = self.events();

        let summary_height = u16::try_from(summary.len().max(1) + 3).unwrap_or(u16::MAX).min(10);
        let layout = Layout::vertical([
            Constraint::Length(1),              // window selector
            Constraint::Length(summary_height), // per-door summary
            Constraint::Min(5),                 // events
            Constraint::Length(1),              // hints
        ])
        .split(inner);

        let active = WINDOWS.iter().position(|&w| w == self.days);
        let selector = match active {
            Some(i) => sub_tabs::render_sub_tabs(&WINDOW_LABELS, i),
            None => Line::from(Span::styled(format!("[{}d]", self.days), theme::tab_active())),
        };
        frame.render_widget(Paragraph::new(selector), layout[0]);

        Self::render_summary(frame, layout[1], &summary);
        self.render_events(frame, layout[2], &events);

        let hints = sub_tabs::render_hints(&[("w", "window"), ("j/k", "scroll")]);
        frame.render_widget(Paragraph::new(hints), layout[3]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &'static str {
        "Doors"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    fn event(name: &str, hour: Option<u32>) -> DoorEvent {
        DoorEvent {
            door_id: name.to_lowercase(),
            door_name: name.into(),
            opened: true,
            timestamp: hour.and_then(|h| Utc.with_ymd_and_hms(2026, 10, 16, h, 0, 0).single()),
            detection_method: None,
            confidence: None,
        }
    }

    #[test]
    fn window_cycles_and_wraps() {
        assert_eq!(next_window(1), 7);
        assert_eq!(next_window(7), 14);
        assert_eq!(next_window(30), 1);
        assert_eq!(next_window(3), 7);
    }

    #[test]
    fn events_sort_newest_first_with_undated_last() {
        let events = [
            event("Front", Some(8)),
            event("Garage", None),
            event("Back", Some(12)),
        ];
        let names: Vec<&str> = newest_first(&events)
            .into_iter()
            .map(|e| e.door_name.as_str())
            .collect();
        assert_eq!(names, ["Back", "Front", "Garage"]);
    }

    #[test]
    fn confidence_is_shown_as_percent() {
        assert_eq!(fmt_confidence(Some(0.87)), "87%");
        assert_eq!(fmt_confidence(None), "--");
    }
}
