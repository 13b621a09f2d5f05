//! All possible UI actions. Actions are the sole mechanism for state mutation.

use ventwatch_core::{
    ConnectionState, Dashboard, DeviceStatus, DoorActivity, HistoryRange, HistorySeries,
    IncidentLog, Notice, NoticeLevel, Severity, Snapshot, TemperatureUnit,
};

use crate::screen::ScreenId;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient toast shown above the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }
}

impl From<Notice> for Notification {
    fn from(notice: Notice) -> Self {
        let level = match notice.level {
            NoticeLevel::Info => NotificationLevel::Info,
            NoticeLevel::Warning => NotificationLevel::Warning,
            NoticeLevel::Error => NotificationLevel::Error,
        };
        Self::new(level, notice.message)
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ──
    SwitchScreen(ScreenId),
    ToggleHelp,

    // ── User commands ──
    Refresh,
    ToggleUnits,
    SelectHistoryRange(HistoryRange),
    SelectDoorWindow(u32),
    SetMinSeverity(Severity),
    ToggleActiveOnly,

    // ── Broadcast to screens ──
    UnitsChanged(TemperatureUnit),

    // ── Data ──
    StatusUpdated(Snapshot<DeviceStatus>),
    DashboardUpdated(Snapshot<Dashboard>),
    HistoryUpdated(Snapshot<HistorySeries>),
    DoorsUpdated(Snapshot<DoorActivity>),
    IncidentsUpdated(Snapshot<IncidentLog>),

    // ── Connection ──
    ConnectionChanged(ConnectionState),
    RefreshStarted,
    RefreshFinished,
    Notify(Notification),
}
