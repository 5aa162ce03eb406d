//! # Shutdown Signal
//!
//! A latched, cloneable stop flag backed by a `watch` channel. Once triggered
//! it stays triggered; late subscribers observe it immediately.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Trigger side, cheap to clone.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        if !self.tx.send_replace(true) {
            debug!("[shared-bus] shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Create a listener for use in `tokio::select!` loops.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive side of the shutdown flag.
#[derive(Clone, Debug)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested.
    ///
    /// Cancel-safe; resolves immediately if the flag is already set.
    pub async fn wait(&mut self) {
        // An error means every trigger handle is gone, which only happens
        // during teardown.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_listener_wakes_on_trigger() {
        let signal = ShutdownSignal::new();
        let mut listener = signal.subscribe();

        let waiter = tokio::spawn(async move {
            listener.wait().await;
        });

        signal.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("listener should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_latched_flag() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.trigger();

        let mut listener = signal.subscribe();
        assert!(listener.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), listener.wait())
            .await
            .expect("already triggered");
    }
}
