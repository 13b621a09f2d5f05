// ── Latest-value data store ──
//
// One `watch` channel per resource holding the most recent snapshot.
// The monitor publishes after every fetch; the TUI subscribes. Writes
// overwrite unconditionally, so overlapping refreshes resolve as
// last-write-wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::cache::CacheRead;
use crate::model::{DeviceStatus, Dashboard, DoorActivity, HistorySeries, IncidentLog};
use crate::stream::SnapshotStream;

/// A published value plus when and how it was obtained.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub data: Arc<T>,
    /// Wall-clock time the value was fetched.
    pub fetched_at: DateTime<Utc>,
    /// The latest fetch failed and this is the previous value.
    pub stale: bool,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            fetched_at: self.fetched_at,
            stale: self.stale,
        }
    }
}

impl<T> Snapshot<T> {
    pub fn from_read(read: &CacheRead<T>, now: DateTime<Utc>) -> Self {
        let age = chrono::Duration::from_std(read.age).unwrap_or_default();
        Self {
            data: Arc::clone(&read.value),
            fetched_at: now - age,
            stale: read.is_stale(),
        }
    }
}

/// Central store for the latest value of every resource.
pub struct DataStore {
    status: watch::Sender<Option<Snapshot<DeviceStatus>>>,
    dashboard: watch::Sender<Option<Snapshot<Dashboard>>>,
    history: watch::Sender<Option<Snapshot<HistorySeries>>>,
    doors: watch::Sender<Option<Snapshot<DoorActivity>>>,
    incidents: watch::Sender<Option<Snapshot<IncidentLog>>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            status: watch::channel(None).0,
            dashboard: watch::channel(None).0,
            history: watch::channel(None).0,
            doors: watch::channel(None).0,
            incidents: watch::channel(None).0,
            last_refresh: watch::channel(None).0,
        }
    }

    // ── Publish ──────────────────────────────────────────────────────
    // `send_replace` updates even with zero receivers.

    pub(crate) fn publish_status(&self, snap: Snapshot<DeviceStatus>) {
        self.status.send_replace(Some(snap));
    }

    pub(crate) fn publish_dashboard(&self, snap: Snapshot<Dashboard>) {
        self.dashboard.send_replace(Some(snap));
    }

    pub(crate) fn publish_history(&self, snap: Snapshot<HistorySeries>) {
        self.history.send_replace(Some(snap));
    }

    pub(crate) fn publish_doors(&self, snap: Snapshot<DoorActivity>) {
        self.doors.send_replace(Some(snap));
    }

    pub(crate) fn publish_incidents(&self, snap: Snapshot<IncidentLog>) {
        self.incidents.send_replace(Some(snap));
    }

    pub(crate) fn mark_refreshed(&self, at: DateTime<Utc>) {
        self.last_refresh.send_replace(Some(at));
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn status(&self) -> Option<Snapshot<DeviceStatus>> {
        self.status.borrow().clone()
    }

    pub fn dashboard(&self) -> Option<Snapshot<Dashboard>> {
        self.dashboard.borrow().clone()
    }

    pub fn history(&self) -> Option<Snapshot<HistorySeries>> {
        self.history.borrow().clone()
    }

    pub fn doors(&self) -> Option<Snapshot<DoorActivity>> {
        self.doors.borrow().clone()
    }

    pub fn incidents(&self) -> Option<Snapshot<IncidentLog>> {
        self.incidents.borrow().clone()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_status(&self) -> SnapshotStream<DeviceStatus> {
        SnapshotStream::new(self.status.subscribe())
    }

    pub fn subscribe_dashboard(&self) -> SnapshotStream<Dashboard> {
        SnapshotStream::new(self.dashboard.subscribe())
    }

    pub fn subscribe_history(&self) -> SnapshotStream<HistorySeries> {
        SnapshotStream::new(self.history.subscribe())
    }

    pub fn subscribe_doors(&self) -> SnapshotStream<DoorActivity> {
        SnapshotStream::new(self.doors.subscribe())
    }

    pub fn subscribe_incidents(&self) -> SnapshotStream<IncidentLog> {
        SnapshotStream::new(self.incidents.subscribe())
    }

    pub fn subscribe_last_refresh(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_refresh.subscribe()
    }
}
