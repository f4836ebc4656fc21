//! # Liveness watches on subscribers.
//!
//! Every `subscribe*` call registers a fresh watch. A watch is a small task that
//! waits for the subscriber's inbox to be dropped and then reports its
//! [`WatchRef`] on the termination channel drained by the broker loop.
//!
//! ```text
//! Watcher::watch(sub) ──► WatchRef(n) + task: select! {
//!                                         token.cancelled()  ─► released, silent
//!                                         sub.terminated()   ─► down_tx.send(WatchRef(n))
//!                                     }
//! ```
//!
//! ## Rules
//! - Handles are never reused, so a recycled subscriber cannot be confused
//!   with a stale watch.
//! - `release` silences a watch (used by `unsubscribe*`); a release always wins
//!   over a termination observed at the same time.
//! - Watch tokens are children of the broker token; broker shutdown releases all.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::subscribers::Subscriber;

static WATCH_SEQ: AtomicU64 = AtomicU64::new(1);

/// Opaque handle identifying one liveness watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchRef(u64);

impl WatchRef {
    fn next() -> Self {
        Self(WATCH_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn for_test(n: u64) -> Self {
        Self(n)
    }
}

impl fmt::Display for WatchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// Registry of active watches, owned by the broker loop.
pub(crate) struct Watcher {
    root: CancellationToken,
    down_tx: mpsc::UnboundedSender<WatchRef>,
    active: HashMap<WatchRef, CancellationToken>,
}

impl Watcher {
    pub(crate) fn new(root: CancellationToken, down_tx: mpsc::UnboundedSender<WatchRef>) -> Self {
        Self {
            root,
            down_tx,
            active: HashMap::new(),
        }
    }

    /// Starts watching `subscriber`; the handle is reported once it terminates.
    pub(crate) fn watch(&mut self, subscriber: &Subscriber) -> WatchRef {
        let watch = WatchRef::next();
        let token = self.root.child_token();
        let released = token.clone();
        let sub = subscriber.clone();
        let down = self.down_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = released.cancelled() => {}
                _ = sub.terminated() => {
                    let _ = down.send(watch);
                }
            }
        });

        self.active.insert(watch, token);
        watch
    }

    /// Stops a watch without reporting it.
    pub(crate) fn release(&mut self, watch: WatchRef) {
        if let Some(token) = self.active.remove(&watch) {
            token.cancel();
        }
    }

    /// Drops bookkeeping for a watch that has already fired.
    ///
    /// Returns `false` if the watch was released before its report arrived.
    pub(crate) fn forget(&mut self, watch: WatchRef) -> bool {
        self.active.remove(&watch).is_some()
    }

    /// Stops every active watch.
    pub(crate) fn release_all(&mut self) {
        for (_, token) in self.active.drain() {
            token.cancel();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::channel;
    use std::time::Duration;

    #[tokio::test]
    async fn test_reports_termination() {
        let (down_tx, mut down_rx) = mpsc::unbounded_channel();
        let mut watcher = Watcher::new(CancellationToken::new(), down_tx);
        let (sub, inbox) = channel();

        let watch = watcher.watch(&sub);
        drop(inbox);

        let fired = tokio::time::timeout(Duration::from_secs(1), down_rx.recv()).await;
        assert_eq!(fired.ok().flatten(), Some(watch));
        assert!(watcher.forget(watch));
        assert_eq!(watcher.len(), 0);
    }

    #[tokio::test]
    async fn test_released_watch_is_silent() {
        let (down_tx, mut down_rx) = mpsc::unbounded_channel();
        let mut watcher = Watcher::new(CancellationToken::new(), down_tx);
        let (sub, inbox) = channel();

        let released = watcher.watch(&sub);
        let kept = watcher.watch(&sub);
        assert_ne!(released, kept);

        watcher.release(released);
        tokio::task::yield_now().await;
        drop(inbox);

        let fired = tokio::time::timeout(Duration::from_secs(1), down_rx.recv()).await;
        assert_eq!(fired.ok().flatten(), Some(kept));
        assert!(!watcher.forget(released));
    }

    #[tokio::test]
    async fn test_release_all_empties_registry() {
        let (down_tx, _down_rx) = mpsc::unbounded_channel();
        let mut watcher = Watcher::new(CancellationToken::new(), down_tx);
        let (a, _ia) = channel();
        let (b, _ib) = channel();

        watcher.watch(&a);
        watcher.watch(&b);
        assert_eq!(watcher.len(), 2);
        watcher.release_all();
        assert_eq!(watcher.len(), 0);
    }
}
