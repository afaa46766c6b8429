// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Task parking and the wake token handed to interrupt handlers.
//!
//! ```text
//!   control task                      interrupt context
//!   ────────────                      ─────────────────
//!   TaskLatch::park().await ──┐
//!        parked = true        │       WakeToken::signal()
//!        (yields)             │◄────── parked.swap(false) == true → notify
//!   returns ◄─────────────────┘       parked.swap(false) == false → dropped
//! ```
//!
//! A signal only counts if the task is parked at that moment. Signals that
//! arrive while the task is running are dropped rather than remembered, so
//! a `park()` right after a wake-up always blocks until the next signal.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct LatchInner {
    parked: AtomicBool,
    notify: Notify,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Counters describing what happened to wake signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LatchStats {
    /// Signals that resumed a parked task.
    pub delivered: u64,
    /// Signals that arrived while the task was not parked.
    pub dropped: u64,
}

/// A parking spot for the single control task.
#[derive(Debug, Default)]
pub struct TaskLatch {
    inner: Arc<LatchInner>,
}

impl TaskLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a wake token bound to this latch.
    pub fn token(&self) -> WakeToken {
        WakeToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Returns `true` while a task is parked here.
    pub fn is_parked(&self) -> bool {
        self.inner.parked.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> LatchStats {
        LatchStats {
            delivered: self.inner.delivered.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
        }
    }

    /// Suspends the calling task until a wake token is signalled.
    ///
    /// Takes `&mut self` so only one task can be parked at a time. If the
    /// returned future is dropped before completing, the latch is unparked
    /// again so a later signal is not mistaken for this wait.
    pub async fn park(&mut self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register as a waiter before advertising the park, so a signal
        // that sees `parked == true` always finds us.
        notified.as_mut().enable();

        let guard = Unpark(&self.inner);
        self.inner.parked.store(true, Ordering::Release);
        notified.await;
        std::mem::forget(guard);
    }
}

/// Clears the parked flag if a park is abandoned part-way.
struct Unpark<'a>(&'a LatchInner);

impl Drop for Unpark<'_> {
    fn drop(&mut self) {
        self.0.parked.store(false, Ordering::Release);
    }
}

/// The capability an interrupt handler holds.
///
/// [`signal`](Self::signal) is the only operation: it does not block,
/// allocate, or perform I/O, so it is safe to call from interrupt context
/// and from any thread, any number of times.
#[derive(Debug, Clone)]
pub struct WakeToken {
    inner: Arc<LatchInner>,
}

impl WakeToken {
    /// Resumes the parked task. Returns `false` (and has no effect) if no
    /// task is parked.
    pub fn signal(&self) -> bool {
        if self.inner.parked.swap(false, Ordering::AcqRel) {
            // Wakes only registered waiters and leaves no permit behind, so
            // a park abandoned after this point cannot bank the wake-up.
            self.inner.notify.notify_waiters();
            self.inner.delivered.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Waits until the latch reports a parked task.
    async fn until_parked(latch: &TaskLatch) {
        while !latch.is_parked() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_signal_without_park_is_dropped() {
        let latch = TaskLatch::new();
        let token = latch.token();
        assert!(!token.signal());
        assert!(!token.signal());
        assert_eq!(latch.stats(), LatchStats { delivered: 0, dropped: 2 });
    }

    #[tokio::test]
    async fn test_park_then_signal() {
        let mut latch = TaskLatch::new();
        let token = latch.token();
        let observer = TaskLatch {
            inner: Arc::clone(&latch.inner),
        };

        let waker = tokio::spawn(async move {
            until_parked(&observer).await;
            assert!(token.signal());
        });

        timeout(Duration::from_secs(1), latch.park())
            .await
            .expect("park should resume after signal");
        waker.await.unwrap();
        assert!(!latch.is_parked());
        assert_eq!(latch.stats().delivered, 1);
    }

    #[tokio::test]
    async fn test_stale_signal_does_not_resume_next_park() {
        let mut latch = TaskLatch::new();
        let token = latch.token();

        // Signals before parking must not be banked.
        token.signal();
        token.signal();

        let parked = timeout(Duration::from_millis(50), latch.park()).await;
        assert!(parked.is_err(), "park returned without a live signal");
        assert!(!latch.is_parked(), "abandoned park must unpark");
    }

    #[tokio::test]
    async fn test_signal_to_abandoned_park_is_not_kept() {
        let mut latch = TaskLatch::new();
        let token = latch.token();

        {
            let park = latch.park();
            tokio::pin!(park);
            assert!(timeout(Duration::from_millis(10), park.as_mut()).await.is_err());
            assert!(token.signal());
            // The parked future is dropped here without being polled again.
        }

        let fresh = timeout(Duration::from_millis(100), latch.park()).await;
        assert!(fresh.is_err(), "fresh park resumed without a new signal");
        assert!(!latch.is_parked());
        assert_eq!(latch.stats(), LatchStats { delivered: 1, dropped: 0 });
    }

    #[tokio::test]
    async fn test_repark_after_wake_blocks() {
        let mut latch = TaskLatch::new();
        let token = latch.token();
        let observer = TaskLatch {
            inner: Arc::clone(&latch.inner),
        };

        tokio::spawn(async move {
            until_parked(&observer).await;
            token.signal();
            // Extra signals right after the wake-up.
            token.signal();
            token.signal();
        });

        timeout(Duration::from_secs(1), latch.park()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let again = timeout(Duration::from_millis(50), latch.park()).await;
        assert!(again.is_err());
        assert_eq!(latch.stats().delivered, 1);
    }

    #[test]
    fn test_signal_across_threads() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()
            .unwrap();
        let mut latch = TaskLatch::new();
        let token = latch.token();
        let observer = TaskLatch {
            inner: Arc::clone(&latch.inner),
        };

        let isr = std::thread::spawn(move || {
            while !observer.is_parked() {
                std::thread::yield_now();
            }
            token.signal()
        });

        rt.block_on(async {
            timeout(Duration::from_secs(1), latch.park()).await.unwrap();
        });
        assert!(isr.join().unwrap());
    }
}
