//! # Outcome Channel
//!
//! Many validators write [`ValidationOutcome`]s, one statistics collector
//! reads them.

use crate::{BusError, DEFAULT_OUTCOME_CAPACITY};
use shared_types::ValidationOutcome;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Create a bounded outcome channel (`capacity` of 0 uses the default).
pub fn outcome_channel(capacity: usize) -> (OutcomeSender, OutcomeReceiver) {
    let capacity = if capacity == 0 {
        DEFAULT_OUTCOME_CAPACITY
    } else {
        capacity
    };
    let (tx, rx) = mpsc::channel(capacity);
    (OutcomeSender { tx }, OutcomeReceiver { rx })
}

/// Writer handle, one clone per validator.
#[derive(Clone, Debug)]
pub struct OutcomeSender {
    tx: mpsc::Sender<ValidationOutcome>,
}

impl OutcomeSender {
    /// Send one outcome, waiting for buffer space.
    pub async fn send(&self, outcome: ValidationOutcome) -> Result<(), BusError> {
        self.tx.send(outcome).await.map_err(|_| BusError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Reader handle owned by the statistics collector.
#[derive(Debug)]
pub struct OutcomeReceiver {
    rx: mpsc::Receiver<ValidationOutcome>,
}

impl OutcomeReceiver {
    /// Next outcome, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<ValidationOutcome> {
        self.rx.recv().await
    }

    /// Non-blocking read used to drain during shutdown.
    ///
    /// `Ok(None)` means the buffer is empty but senders remain.
    pub fn try_recv(&mut self) -> Result<Option<ValidationOutcome>, BusError> {
        match self.rx.try_recv() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(BusError::Closed),
        }
    }
}
