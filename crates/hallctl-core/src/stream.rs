// ── Reactive status stream ──
//
// Subscription handle for consuming live-status snapshots from the status
// channel.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::LiveStatusSnapshot;

/// Latest snapshot, or `None` before the first update of a channel.
pub type SnapshotSlot = Option<Arc<LiveStatusSnapshot>>;

/// A subscription to the live-status snapshot.
///
/// Provides both point-in-time access and change notification via
/// [`changed()`](Self::changed) or by converting into a `Stream`.
pub struct StatusStream {
    current: SnapshotSlot,
    receiver: watch::Receiver<SnapshotSlot>,
}

impl StatusStream {
    pub(crate) fn new(receiver: watch::Receiver<SnapshotSlot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &SnapshotSlot {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> SnapshotSlot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next update, returning the new snapshot.
    /// Returns `None` if the status channel has been dropped.
    pub async fn changed(&mut self) -> Option<SnapshotSlot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current.clone_from(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> StatusWatchStream {
        StatusWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current value first, then every subsequent update.
pub struct StatusWatchStream {
    inner: WatchStream<SnapshotSlot>,
}

impl Stream for StatusWatchStream {
    type Item = SnapshotSlot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
