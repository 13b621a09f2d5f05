// ── Monitor ──
//
// Lifecycle for one device's telemetry: initial refresh, interval
// polling, per-resource caching, and publishing into the DataStore.
// Every refresh is independent; a failure only affects its own resource
// and the next tick tries again.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ventwatch_api::{ApiClient, Credentials};

use crate::cache::{CacheRead, CacheUpdate, TtlCache};
use crate::config::MonitorConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::{Dashboard, DeviceStatus, DoorActivity, HistoryRange, HistorySeries, IncidentLog};
use crate::session::{AuthVerdict, Session};
use crate::store::{DataStore, Snapshot};
use crate::stream::SnapshotStream;

const NOTICE_CHANNEL_SIZE: usize = 64;
const CACHE_UPDATE_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Monitor state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    /// Last refresh succeeded for every resource.
    Connected,
    /// Last refresh failed or went stale for some resources.
    Degraded { failing: usize },
    /// Last refresh produced nothing at all.
    Failed,
    /// API key rejected repeatedly; polling stopped.
    AuthRevoked,
}

// ── Notices ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Banner message for the UI.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

// ── RefreshReport ────────────────────────────────────────────────

/// Outcome of one refresh cycle, per resource.
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub fresh: Vec<&'static str>,
    pub stale: Vec<&'static str>,
    pub failed: Vec<(&'static str, CoreError)>,
}

impl RefreshReport {
    fn record<T>(&mut self, resource: &'static str, result: Result<Snapshot<T>, CoreError>) {
        match result {
            Ok(snap) if snap.stale => self.stale.push(resource),
            Ok(_) => self.fresh.push(resource),
            Err(e) => self.failed.push((resource, e)),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.stale.is_empty() && self.failed.is_empty()
    }

    fn state(&self) -> ConnectionState {
        if self.is_clean() {
            ConnectionState::Connected
        } else if self.fresh.is_empty() && self.stale.is_empty() {
            ConnectionState::Failed
        } else {
            ConnectionState::Degraded {
                failing: self.stale.len() + self.failed.len(),
            }
        }
    }
}

// ── Monitor ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<MonitorInner>`.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    client: ApiClient,
    session: Session,
    store: Arc<DataStore>,
    status_cache: TtlCache<DeviceStatus>,
    dashboard_cache: TtlCache<Dashboard>,
    history_cache: TtlCache<HistorySeries>,
    doors_cache: TtlCache<DoorActivity>,
    incidents_cache: TtlCache<IncidentLog>,
    cache_updates: broadcast::Sender<CacheUpdate>,
    history_range: ArcSwap<HistoryRange>,
    door_window_days: AtomicU32,
    connection_state: watch::Sender<ConnectionState>,
    notices: broadcast::Sender<Notice>,
    /// Resources whose last fetch failed, with the error text.
    failing: DashMap<&'static str, String>,
    cancel: CancellationToken,
    /// Child token for the current poll task, replaced on every start.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Build the API client and caches. Does NOT fetch anything --
    /// call [`start()`](Self::start) to begin polling.
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let credentials = Credentials::from(&config.auth);
        let client = ApiClient::new(config.url.as_str(), &credentials, &config.transport())?;
        let session = Session::new(credentials.strategy(), config.unauthorized_threshold);

        let (cache_updates, _) = broadcast::channel(CACHE_UPDATE_CHANNEL_SIZE);
        let short = config.cache_ttl;
        let long = config.long_ttl();
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Ok(Self {
            inner: Arc::new(MonitorInner {
                status_cache: TtlCache::with_sender(short, cache_updates.clone()),
                dashboard_cache: TtlCache::with_sender(short, cache_updates.clone()),
                history_cache: TtlCache::with_sender(long, cache_updates.clone()),
                doors_cache: TtlCache::with_sender(long, cache_updates.clone()),
                incidents_cache: TtlCache::with_sender(long, cache_updates.clone()),
                cache_updates,
                history_range: ArcSwap::from_pointee(config.history_range),
                door_window_days: AtomicU32::new(config.door_window_days),
                client,
                session,
                store: Arc::new(DataStore::new()),
                connection_state,
                notices,
                failing: DashMap::new(),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
                config,
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Run the first refresh, then poll every `refresh_interval_secs`.
    ///
    /// Partial failures do not abort startup; they are reported and
    /// retried on the next tick. Only a revoked session is an error.
    pub async fn start(&self) -> Result<RefreshReport, CoreError> {
        self.set_state(ConnectionState::Connecting);

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let report = self.refresh().await?;

        let interval_secs = self.inner.config.refresh_interval_secs;
        if interval_secs > 0 {
            let handle = tokio::spawn(refresh_task(self.clone(), interval_secs, child));
            self.inner.task_handles.lock().await.push(handle);
            info!(interval_secs, "polling started");
        }
        Ok(report)
    }

    /// Stop polling and wait for the poll task to exit.
    pub async fn stop(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.connection_state.send_if_modified(|state| {
            if *state == ConnectionState::AuthRevoked {
                false
            } else {
                *state = ConnectionState::Disconnected;
                true
            }
        });
        debug!("monitor stopped");
    }

    /// Build a monitor, run `f`, then stop. No poll task is spawned.
    pub async fn oneshot<F, Fut, T, E>(config: MonitorConfig, f: F) -> Result<T, E>
    where
        F: FnOnce(Monitor) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CoreError>,
    {
        let mut cfg = config;
        cfg.refresh_interval_secs = 0;

        let monitor = Monitor::new(cfg)?;
        let result = f(monitor.clone()).await;
        monitor.stop().await;
        result
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Fetch every resource through its cache and publish the results.
    ///
    /// Overlapping calls are allowed; whichever finishes last wins.
    pub async fn refresh(&self) -> Result<RefreshReport, CoreError> {
        let range = self.history_range();
        let days = self.door_window_days();
        let hours = self.inner.config.incident_window_hours;

        let (status, dashboard, history, doors, incidents) = tokio::join!(
            self.read_status(),
            self.read_dashboard(),
            self.read_history(range),
            self.read_door_events(days),
            self.read_incidents(hours),
        );

        // Five concurrent 401s are one rejected cycle, not five.
        self.settle_auth()?;
        if self.inner.session.is_revoked() {
            return Err(self.revoked_error());
        }

        let mut report = RefreshReport::default();
        report.record("status", status);
        report.record("dashboard", dashboard);
        report.record("history", history);
        report.record("doors", doors);
        report.record("incidents", incidents);

        self.emit_notices(&report);
        self.inner.store.mark_refreshed(Utc::now());
        self.set_state(report.state());

        debug!(
            fresh = report.fresh.len(),
            stale = report.stale.len(),
            failed = report.failed.len(),
            "refresh complete"
        );
        Ok(report)
    }

    /// Drop every cached value, then refresh.
    pub async fn force_refresh(&self) -> Result<RefreshReport, CoreError> {
        self.inner.status_cache.clear();
        self.inner.dashboard_cache.clear();
        self.inner.history_cache.clear();
        self.inner.doors_cache.clear();
        self.inner.incidents_cache.clear();
        self.refresh().await
    }

    // ── Resource reads (cache-backed) ────────────────────────────
    //
    // Each public read is one auth cycle on its own. `refresh()` batches
    // the private `read_*` variants into a single cycle.

    pub async fn status(&self) -> Result<Snapshot<DeviceStatus>, CoreError> {
        self.settled(self.read_status()).await
    }

    pub async fn dashboard(&self) -> Result<Snapshot<Dashboard>, CoreError> {
        self.settled(self.read_dashboard()).await
    }

    pub async fn history(&self, range: HistoryRange) -> Result<Snapshot<HistorySeries>, CoreError> {
        self.settled(self.read_history(range)).await
    }

    pub async fn door_events(&self, days: u32) -> Result<Snapshot<DoorActivity>, CoreError> {
        self.settled(self.read_door_events(days)).await
    }

    pub async fn incidents(&self, hours: u32) -> Result<Snapshot<IncidentLog>, CoreError> {
        self.settled(self.read_incidents(hours)).await
    }

    async fn read_status(&self) -> Result<Snapshot<DeviceStatus>, CoreError> {
        let this = self;
        let client = &self.inner.client;
        let read = self
            .cached(&self.inner.status_cache, "status", move || async move {
                this.call(client.status()).await.map(DeviceStatus::from)
            })
            .await?;
        let snap = Snapshot::from_read(&read, Utc::now());
        self.inner.store.publish_status(snap.clone());
        Ok(snap)
    }

    async fn read_dashboard(&self) -> Result<Snapshot<Dashboard>, CoreError> {
        let this = self;
        let client = &self.inner.client;
        let read = self
            .cached(&self.inner.dashboard_cache, "dashboard", move || async move {
                this.call(client.enhanced_dashboard())
                    .await
                    .map(Dashboard::from)
            })
            .await?;
        let snap = Snapshot::from_read(&read, Utc::now());
        self.inner.store.publish_dashboard(snap.clone());
        Ok(snap)
    }

    async fn read_history(
        &self,
        range: HistoryRange,
    ) -> Result<Snapshot<HistorySeries>, CoreError> {
        let this = self;
        let client = &self.inner.client;
        let key = range.cache_key();
        let read = self
            .cached(&self.inner.history_cache, &key, move || async move {
                this.call(client.history(range.hours()))
                    .await
                    .map(|resp| convert::history_series(range, resp))
            })
            .await?;
        let snap = Snapshot::from_read(&read, Utc::now());
        // A slow response for an old range must not replace the chart the
        // user has since switched to.
        if range == self.history_range() {
            self.inner.store.publish_history(snap.clone());
        }
        Ok(snap)
    }

    async fn read_door_events(&self, days: u32) -> Result<Snapshot<DoorActivity>, CoreError> {
        let this = self;
        let client = &self.inner.client;
        let key = format!("doors:{days}d");
        let read = self
            .cached(&self.inner.doors_cache, &key, move || async move {
                this.call(client.door_analytics(days))
                    .await
                    .map(|resp| convert::door_activity(days, resp))
            })
            .await?;
        let snap = Snapshot::from_read(&read, Utc::now());
        if days == self.door_window_days() {
            self.inner.store.publish_doors(snap.clone());
        }
        Ok(snap)
    }

    async fn read_incidents(&self, hours: u32) -> Result<Snapshot<IncidentLog>, CoreError> {
        let this = self;
        let client = &self.inner.client;
        let key = format!("incidents:{hours}h");
        let read = self
            .cached(&self.inner.incidents_cache, &key, move || async move {
                this.call(client.incidents(hours))
                    .await
                    .map(|resp| convert::incident_log(hours, resp))
            })
            .await?;
        let snap = Snapshot::from_read(&read, Utc::now());
        if hours == self.inner.config.incident_window_hours {
            self.inner.store.publish_incidents(snap.clone());
        }
        Ok(snap)
    }

    // ── Selection ────────────────────────────────────────────────

    pub fn history_range(&self) -> HistoryRange {
        **self.inner.history_range.load()
    }

    /// Switch the charted range and fetch it right away.
    pub async fn select_history_range(
        &self,
        range: HistoryRange,
    ) -> Result<Snapshot<HistorySeries>, CoreError> {
        self.inner.history_range.store(Arc::new(range));
        self.history(range).await
    }

    pub fn door_window_days(&self) -> u32 {
        self.inner.door_window_days.load(Ordering::Acquire)
    }

    pub async fn select_door_window(&self, days: u32) -> Result<Snapshot<DoorActivity>, CoreError> {
        self.inner.door_window_days.store(days, Ordering::Release);
        self.door_events(days).await
    }

    // ── Observables ──────────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    pub fn cache_updates(&self) -> broadcast::Receiver<CacheUpdate> {
        self.inner.cache_updates.subscribe()
    }

    pub fn status_stream(&self) -> SnapshotStream<DeviceStatus> {
        self.inner.store.subscribe_status()
    }

    pub fn dashboard_stream(&self) -> SnapshotStream<Dashboard> {
        self.inner.store.subscribe_dashboard()
    }

    pub fn history_stream(&self) -> SnapshotStream<HistorySeries> {
        self.inner.store.subscribe_history()
    }

    pub fn doors_stream(&self) -> SnapshotStream<DoorActivity> {
        self.inner.store.subscribe_doors()
    }

    pub fn incidents_stream(&self) -> SnapshotStream<IncidentLog> {
        self.inner.store.subscribe_incidents()
    }

    // ── Internals ────────────────────────────────────────────────

    /// Run a cache read, refusing to serve anything once revoked.
    async fn cached<T, F, Fut>(
        &self,
        cache: &TtlCache<T>,
        key: &str,
        fetch: F,
    ) -> Result<CacheRead<T>, CoreError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        if self.inner.session.is_revoked() {
            return Err(self.revoked_error());
        }
        let read = cache.get_or_fetch(key, fetch).await?;
        if self.inner.session.is_revoked() {
            return Err(self.revoked_error());
        }
        Ok(read)
    }

    /// Await an API call and note its auth outcome for the current cycle.
    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, ventwatch_api::Error>>,
    ) -> Result<T, CoreError> {
        match request.await {
            Ok(value) => {
                self.inner.session.note_accepted();
                Ok(value)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.inner.session.note_unauthorized();
                }
                Err(e.into())
            }
        }
    }

    /// Run one read as its own auth cycle.
    async fn settled<T>(
        &self,
        read: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        let result = read.await;
        self.settle_auth()?;
        result
    }

    /// Close the auth cycle. Errors only when it revoked the session.
    fn settle_auth(&self) -> Result<(), CoreError> {
        match self.inner.session.settle() {
            Some(AuthVerdict::Revoked { consecutive }) => {
                self.revoke(consecutive);
                Err(CoreError::SessionRevoked {
                    attempts: consecutive,
                })
            }
            Some(AuthVerdict::Rejected { consecutive }) => {
                warn!(consecutive, "API rejected the credential");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn revoke(&self, attempts: u32) {
        let changed = self.inner.connection_state.send_if_modified(|state| {
            if *state == ConnectionState::AuthRevoked {
                false
            } else {
                *state = ConnectionState::AuthRevoked;
                true
            }
        });
        if changed {
            warn!(attempts, "API key rejected repeatedly, revoking session");
            if let Ok(guard) = self.inner.cancel_child.try_lock() {
                guard.cancel();
            }
            let _ = self.inner.notices.send(Notice::new(
                NoticeLevel::Error,
                "API key was rejected. Signed out; run `ventwatch login` with a fresh dashboard link.",
            ));
        }
    }

    fn revoked_error(&self) -> CoreError {
        CoreError::SessionRevoked {
            attempts: self.inner.session.consecutive_rejections(),
        }
    }

    fn set_state(&self, next: ConnectionState) {
        self.inner.connection_state.send_if_modified(|state| {
            if *state == next || *state == ConnectionState::AuthRevoked {
                false
            } else {
                *state = next;
                true
            }
        });
    }

    /// One banner per resource when it starts failing, one when it recovers.
    fn emit_notices(&self, report: &RefreshReport) {
        for (resource, err) in &report.failed {
            let message = err.to_string();
            if self.inner.failing.insert(*resource, message.clone()).is_none() {
                let _ = self.inner.notices.send(Notice::new(
                    NoticeLevel::Error,
                    format!("Could not load {resource}: {message}"),
                ));
            }
        }
        for resource in &report.stale {
            if self
                .inner
                .failing
                .insert(*resource, "stale".into())
                .is_none()
            {
                let _ = self.inner.notices.send(Notice::new(
                    NoticeLevel::Warning,
                    format!("Refresh of {resource} failed, showing cached data"),
                ));
            }
        }
        for resource in &report.fresh {
            if self.inner.failing.remove(resource).is_some() {
                let _ = self.inner.notices.send(Notice::new(
                    NoticeLevel::Info,
                    format!("{resource} is back"),
                ));
            }
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

async fn refresh_task(monitor: Monitor, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match monitor.refresh().await {
                    Ok(report) if !report.is_clean() => {
                        warn!(failed = report.failed.len(), stale = report.stale.len(), "periodic refresh incomplete");
                    }
                    Ok(_) => {}
                    Err(e @ CoreError::SessionRevoked { .. }) => {
                        warn!(error = %e, "stopping poll");
                        break;
                    }
                    Err(e) => warn!(error = %e, "periodic refresh failed"),
                }
            }
        }
    }
}
