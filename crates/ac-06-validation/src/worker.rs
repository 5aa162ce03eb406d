//! One validator worker loop.

use std::sync::Arc;
use std::time::Duration;

use ac_04_block_transport::BlockTransport;
use shared_bus::ShutdownListener;
use tracing::{debug, error, info, warn};

use crate::state::{StateCell, ValidatorState};
use crate::validator::BlockValidator;

/// Pause before reading again after a transport I/O error.
const READ_RETRY: Duration = Duration::from_millis(50);

pub(crate) struct ValidatorWorker {
    pub(crate) slot: usize,
    pub(crate) validator: BlockValidator,
    pub(crate) transport: Arc<BlockTransport>,
    pub(crate) state: Arc<StateCell>,
    pub(crate) stop: ShutdownListener,
}

impl ValidatorWorker {
    /// Loop until the transport closes or a stop request arrives between
    /// messages.
    pub(crate) async fn run(mut self) {
        info!(validator = self.slot, "[ac-06] 🔍 Validator started");
        loop {
            if self.stop.is_triggered() {
                debug!(validator = self.slot, "[ac-06] stop requested");
                break;
            }

            self.state.set(ValidatorState::Reading);
            let received = tokio::select! {
                received = self.transport.recv() => received,
                _ = self.stop.wait() => break,
            };

            let msg = match received {
                Ok(msg) => msg,
                Err(e) if e.ends_stream() => {
                    info!(validator = self.slot, reason = %e, "[ac-06] transport finished");
                    break;
                }
                Err(e) => {
                    warn!(validator = self.slot, error = %e, "[ac-06] read failed, retrying");
                    self.state.set(ValidatorState::Idle);
                    tokio::select! {
                        _ = tokio::time::sleep(READ_RETRY) => {}
                        _ = self.stop.wait() => break,
                    }
                    continue;
                }
            };

            if let Err(e) = self.validator.process(self.slot, &msg, &self.state).await {
                if e.is_recoverable() {
                    warn!(validator = self.slot, error = %e, "[ac-06] outcome not delivered");
                } else {
                    error!(validator = self.slot, error = %e, "[ac-06] validator failed");
                    break;
                }
            }
            self.state.set(ValidatorState::Idle);
        }
        self.state.set(ValidatorState::Stopped);
        info!(validator = self.slot, "[ac-06] Validator stopped");
    }
}
