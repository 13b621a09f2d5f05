//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Tabs},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ventwatch_config::CredentialSource;
use ventwatch_core::{ConnectionState, Monitor, TemperatureUnit};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::fmt;

const TOAST_TTL: Duration = Duration::from_secs(4);

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    connection: ConnectionState,
    help_visible: bool,
    units: TemperatureUnit,
    /// Refreshes in flight; the throbber spins while non-zero.
    refreshing: usize,
    throbber: ThrobberState,
    /// Fetch time of the newest device status.
    last_update: Option<DateTime<Utc>>,
    terminal_size: (u16, u16),
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    monitor: Monitor,
    profile_name: String,
    /// Where the key came from; decides what is forgotten on revocation.
    credential_source: CredentialSource,
    data_cancel: CancellationToken,
    notification: Option<(Notification, Instant)>,
    /// Set once the stored key has been dropped after a revocation.
    session_revoked: bool,
}

impl App {
    pub fn new(
        monitor: Monitor,
        profile_name: String,
        credential_source: CredentialSource,
        units: TemperatureUnit,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let config = monitor.config();
        let screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens(config.history_range, config.door_window_days)
                .into_iter()
                .collect();

        Self {
            active_screen: ScreenId::Dashboard,
            screens,
            running: true,
            connection: ConnectionState::Disconnected,
            help_visible: false,
            units,
            refreshing: 0,
            throbber: ThrobberState::default(),
            last_update: None,
            terminal_size: (0, 0),
            action_tx,
            action_rx,
            monitor,
            profile_name,
            credential_source,
            data_cancel: CancellationToken::new(),
            notification: None,
            session_revoked: false,
        }
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.terminal_size = tui.size().unwrap_or((80, 24));

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        self.action_tx.send(Action::UnitsChanged(self.units))?;

        let monitor = self.monitor.clone();
        let cancel = self.data_cancel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            crate::data_bridge::spawn_data_bridge(monitor, tx, cancel).await;
        });

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!(profile = %self.profile_name, "TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Global keys are handled here; the rest go to the active screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),

            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char('?')) => {
                return Ok(Some(Action::ToggleHelp));
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => return Ok(Some(Action::Refresh)),
            (KeyModifiers::NONE, KeyCode::Char('u')) => return Ok(Some(Action::ToggleUnits)),

            (_, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (_, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }

            // Incidents owns 0-3 for its severity floor.
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='4'))
                if !(self.active_screen == ScreenId::Incidents && c <= '3') =>
            {
                let n = c.to_digit(10).and_then(|d| u8::try_from(d).ok());
                if let Some(screen) = n.and_then(ScreenId::from_number) {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }

            _ => {}
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }
        Ok(None)
    }

    /// Update app state and propagate to components.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Resize(w, h) => self.terminal_size = (*w, *h),

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        debug!(from = screen.id(), to = %target, "switching screen");
                        screen.set_focused(false);
                    }
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Render => {}

            Action::Tick => {
                if let Some((_, shown)) = &self.notification {
                    if shown.elapsed() > TOAST_TTL {
                        self.notification = None;
                    }
                }
                if self.refreshing > 0 {
                    self.throbber.calc_next();
                }
            }

            // ── User commands ──
            Action::Refresh => self.spawn_refresh()?,

            Action::ToggleUnits => {
                self.units = self.units.toggle();
                self.action_tx.send(Action::UnitsChanged(self.units))?;
                self.action_tx.send(Action::Notify(Notification::info(format!(
                    "Showing temperatures in {}",
                    self.units.symbol()
                ))))?;
            }

            Action::SelectHistoryRange(range) => {
                let monitor = self.monitor.clone();
                let tx = self.action_tx.clone();
                let range = *range;
                tokio::spawn(async move {
                    if let Err(e) = monitor.select_history_range(range).await {
                        warn!(error = %e, %range, "history fetch failed");
                        let _ = tx.send(Action::Notify(Notification::warning(format!(
                            "History {range}: {e}"
                        ))));
                    }
                });
                self.broadcast(action)?;
            }

            Action::SelectDoorWindow(days) => {
                let monitor = self.monitor.clone();
                let tx = self.action_tx.clone();
                let days = *days;
                tokio::spawn(async move {
                    if let Err(e) = monitor.select_door_window(days).await {
                        warn!(error = %e, days, "door events fetch failed");
                        let _ = tx.send(Action::Notify(Notification::warning(format!(
                            "Doors {days}d: {e}"
                        ))));
                    }
                });
                self.broadcast(action)?;
            }

            // ── Connection ──
            Action::ConnectionChanged(state) => {
                self.connection = state.clone();
                if *state == ConnectionState::AuthRevoked {
                    self.forget_revoked_key()?;
                }
            }
            Action::RefreshStarted => self.refreshing += 1,
            Action::RefreshFinished => self.refreshing = self.refreshing.saturating_sub(1),
            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),

            // Data updates go to ALL screens so they stay in sync.
            Action::StatusUpdated(snap) => {
                self.last_update = Some(snap.fetched_at);
                self.broadcast(action)?;
            }
            Action::DashboardUpdated(_)
            | Action::HistoryUpdated(_)
            | Action::DoorsUpdated(_)
            | Action::IncidentsUpdated(_)
            | Action::UnitsChanged(_)
            | Action::SetMinSeverity(_)
            | Action::ToggleActiveOnly => self.broadcast(action)?,
        }
        Ok(())
    }

    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    /// Bypass the cache for every resource. Reports the outcome as a toast.
    fn spawn_refresh(&self) -> Result<()> {
        self.action_tx.send(Action::RefreshStarted)?;
        let monitor = self.monitor.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let notification = match monitor.force_refresh().await {
                Ok(report) if report.failed.is_empty() => Notification::success("Refreshed"),
                Ok(report) => {
                    let failed: Vec<&str> = report.failed.iter().map(|(name, _)| *name).collect();
                    Notification::warning(format!("Refresh failed for {}", failed.join(", ")))
                }
                Err(e) => {
                    warn!(error = %e, "refresh failed");
                    Notification::error(e.to_string())
                }
            };
            let _ = tx.send(Action::Notify(notification));
            let _ = tx.send(Action::RefreshFinished);
        });
        Ok(())
    }

    /// Drop the profile's stored key once the API has revoked it. A key
    /// from the environment is left for the user to replace.
    fn forget_revoked_key(&mut self) -> Result<()> {
        if self.session_revoked {
            return Ok(());
        }
        self.session_revoked = true;

        let source = self.credential_source;
        let message = if source.is_stored() {
            let profile = self.profile_name.clone();
            tokio::task::spawn_blocking(move || {
                if let Err(e) = ventwatch_config::forget_revoked(&profile, source) {
                    warn!(error = %e, profile = %profile, "could not forget revoked key");
                }
            });
            format!("API key revoked; run `ventwatch login -p {}`", self.profile_name)
        } else {
            "API key revoked; replace the key in your environment".to_owned()
        };

        self.action_tx.send(Action::Notify(Notification::error(message)))?;
        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Layout: [screen content] [tab bar] [status bar]
        let layout = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }
        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        // Overlays, last is topmost.
        if let Some((ref notif, _)) = self.notification {
            Self::render_notification(frame, area, notif);
        }
        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let narrow = self.terminal_size.0 < 60;
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                let label = if narrow { id.label_short() } else { id.label() };
                Line::from(Span::styled(format!(" {} {label} ", id.number()), style))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );
        frame.render_widget(tabs, area);
    }

    fn connection_indicator(&self) -> Span<'static> {
        match &self.connection {
            ConnectionState::Connected => {
                Span::styled("● connected", Style::default().fg(theme::SUCCESS_GREEN))
            }
            ConnectionState::Connecting => {
                Span::styled("◐ connecting", Style::default().fg(theme::ELECTRIC_YELLOW))
            }
            ConnectionState::Degraded { failing } => Span::styled(
                format!("◐ degraded ({failing} failing)"),
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ),
            ConnectionState::Disconnected => {
                Span::styled("○ disconnected", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionState::Failed => {
                Span::styled("○ unreachable", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionState::AuthRevoked => {
                Span::styled("✗ key revoked", Style::default().fg(theme::ERROR_RED))
            }
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let [left, right] =
            Layout::horizontal([Constraint::Min(1), Constraint::Length(16)]).areas(area);

        let updated = self.last_update.map_or_else(
            || fmt::MISSING.to_owned(),
            |at| fmt::fmt_age(at, Utc::now()),
        );
        let line = Line::from(vec![
            Span::raw(" "),
            self.connection_indicator(),
            Span::styled(format!(" │ {}", self.units.symbol()), theme::key_hint()),
            Span::styled(format!(" │ updated {updated}"), theme::key_hint()),
            Span::styled(" │ r refresh  u units  ? help  q quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), left);

        if self.refreshing > 0 {
            let throbber = Throbber::default()
                .label("refreshing")
                .style(theme::key_hint())
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, right, &mut self.throbber.clone());
        }
    }

    /// Toast in the bottom-right corner, above the status bar.
    fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
        let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
        let width = msg_len
            .saturating_add(6)
            .clamp(20, 60)
            .min(area.width.saturating_sub(2));
        let height = 3u16;

        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 2);
        let toast_area = Rect::new(area.x + x, area.y + y, width, height);

        let (border_color, icon) = match notif.level {
            NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
            NotificationLevel::Error => (theme::ERROR_RED, "✗"),
            NotificationLevel::Warning => (theme::ELECTRIC_YELLOW, "!"),
            NotificationLevel::Info => (theme::NEON_CYAN, "·"),
        };

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            toast_area,
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
            Span::styled(notif.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let help_width = 56u16.min(area.width.saturating_sub(4));
        let help_height = 21u16.min(area.height.saturating_sub(4));
        let x = (area.width.saturating_sub(help_width)) / 2;
        let y = (area.height.saturating_sub(help_height)) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            help_area,
        );

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let section = |title: &'static str| {
            vec![
                Line::from(Span::styled(
                    format!("  {title}"),
                    Style::default().fg(theme::NEON_CYAN),
                )),
                Line::from(Span::styled(
                    format!("  {}", "─".repeat(title.chars().count())),
                    theme::key_hint(),
                )),
            ]
        };
        let key = |k: &'static str, desc: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {k:<10}"), theme::key_hint_key()),
                Span::styled(desc, theme::key_hint()),
            ])
        };

        let mut help_text = vec![Line::from("")];
        help_text.extend(section("Global"));
        help_text.extend([
            key("1-4 Tab", "Switch screen"),
            key("r", "Refresh now"),
            key("u", "Toggle °C / °F"),
            key("?", "This help"),
            key("q", "Quit"),
            Line::from(""),
        ]);
        help_text.extend(section("History"));
        help_text.extend([
            key("h s d w", "1h / 6h / 24h / 7d"),
            key("m", "Cycle metric"),
            Line::from(""),
        ]);
        help_text.extend(section("Incidents / Doors"));
        help_text.extend([
            key("0-3", "Minimum severity"),
            key("a", "Active incidents only"),
            key("w", "Door window"),
            key("j/k", "Move selection"),
        ]);

        frame.render_widget(Paragraph::new(help_text), inner);
    }
}
