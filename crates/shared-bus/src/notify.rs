//! # Wake-up Primitives
//!
//! - [`WakeBroadcast`]: wakes every task currently waiting (miners). A task
//!   that is not yet waiting misses the wake-up, so waiters must register with
//!   [`Notified::enable`] before they re-check the condition they wait for.
//! - [`RequestSignal`]: a doorbell for a single consumer (controller,
//!   statistics). A request raised while nobody waits is stored and consumed
//!   by the next wait; several requests coalesce into one.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// Broadcast wake-up with a generation counter.
#[derive(Debug, Default)]
pub struct WakeBroadcast {
    notify: Notify,
    generation: AtomicU64,
}

impl WakeBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake every registered waiter. Returns the new generation.
    pub fn wake_all(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.notify.notify_waiters();
        generation
    }

    /// Number of broadcasts sent so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Future resolving on the next broadcast.
    pub fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }
}

/// Coalescing single-consumer request flag.
#[derive(Debug, Default)]
pub struct RequestSignal {
    notify: Notify,
    raised: AtomicU64,
}

impl RequestSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.raised.fetch_add(1, Ordering::Relaxed);
        self.notify.notify_one();
    }

    /// Wait for the next (or a stored) request.
    pub async fn requested(&self) {
        self.notify.notified().await;
    }

    /// Requests raised since creation.
    pub fn total_requests(&self) -> u64 {
        self.raised.load(Ordering::Relaxed)
    }
}
