// ── Reactive snapshot streams ──
//
// Subscription handle for one resource in the DataStore.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::Snapshot;

/// A subscription to the latest snapshot of one resource.
///
/// `None` until the first successful fetch.
pub struct SnapshotStream<T: Send + Sync + 'static> {
    current: Option<Snapshot<T>>,
    receiver: watch::Receiver<Option<Snapshot<T>>>,
}

impl<T: Send + Sync + 'static> SnapshotStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Option<Snapshot<T>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation (or at the last `changed()`).
    pub fn current(&self) -> Option<&Snapshot<T>> {
        self.current.as_ref()
    }

    /// Latest snapshot, which may be newer than `current()`.
    pub fn latest(&self) -> Option<Snapshot<T>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publish. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Option<Snapshot<T>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current.clone_from(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SnapshotWatchStream<T> {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct SnapshotWatchStream<T: Send + Sync + 'static> {
    inner: WatchStream<Option<Snapshot<T>>>,
}

impl<T: Send + Sync + 'static> Stream for SnapshotWatchStream<T> {
    type Item = Option<Snapshot<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
