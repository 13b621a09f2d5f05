//! Screen implementations. Each screen is a top-level Component.

pub mod dashboard;
pub mod doors;
pub mod history;
pub mod incidents;

use ventwatch_core::HistoryRange;

use crate::component::Component;
use crate::screen::ScreenId;

/// Create screen components for the tab bar, seeded with the monitor's
/// initial selections.
pub fn create_screens(
    history_range: HistoryRange,
    door_days: u32,
) -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (
            ScreenId::Dashboard,
            Box::new(dashboard::DashboardScreen::new()),
        ),
        (
            ScreenId::History,
            Box::new(history::HistoryScreen::new(history_range)),
        ),
        (
            ScreenId::Incidents,
            Box::new(incidents::IncidentsScreen::new()),
        ),
        (ScreenId::Doors, Box::new(doors::DoorsScreen::new(door_days))),
    ]
}
