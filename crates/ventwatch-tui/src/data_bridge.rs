//! Data bridge: connects [`Monitor`] streams to TUI actions.
//!
//! Runs as a background task. Subscribes to every snapshot stream, the
//! connection state and the notice channel, starts polling, then forwards
//! each change as an [`Action`] through the TUI's action channel.

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use ventwatch_core::Monitor;

use crate::action::{Action, Notification};

pub async fn spawn_data_bridge(
    monitor: Monitor,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    // Subscribe before starting so the first refresh is observed.
    let mut status = monitor.status_stream();
    let mut dashboard = monitor.dashboard_stream();
    let mut history = monitor.history_stream();
    let mut doors = monitor.doors_stream();
    let mut incidents = monitor.incidents_stream();
    let mut conn_state = monitor.connection_state();
    let mut notices = monitor.notices();

    let _ = action_tx.send(Action::ConnectionChanged(conn_state.borrow().clone()));
    let _ = action_tx.send(Action::RefreshStarted);

    if let Err(e) = monitor.start().await {
        warn!(error = %e, "monitor failed to start");
        let _ = action_tx.send(Action::Notify(Notification::error(e.to_string())));
    }
    let _ = action_tx.send(Action::RefreshFinished);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = conn_state.changed() => {
                let state = conn_state.borrow_and_update().clone();
                debug!(?state, "connection state changed");
                let _ = action_tx.send(Action::ConnectionChanged(state));
            }
            Some(Some(snap)) = status.changed() => {
                let _ = action_tx.send(Action::StatusUpdated(snap));
            }
            Some(Some(snap)) = dashboard.changed() => {
                let _ = action_tx.send(Action::DashboardUpdated(snap));
            }
            Some(Some(snap)) = history.changed() => {
                let _ = action_tx.send(Action::HistoryUpdated(snap));
            }
            Some(Some(snap)) = doors.changed() => {
                let _ = action_tx.send(Action::DoorsUpdated(snap));
            }
            Some(Some(snap)) = incidents.changed() => {
                let _ = action_tx.send(Action::IncidentsUpdated(snap));
            }
            notice = notices.recv() => match notice {
                Ok(notice) => {
                    let _ = action_tx.send(Action::Notify(Notification::from(notice)));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "notice channel lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    monitor.stop().await;
    debug!("data bridge shut down");
}
