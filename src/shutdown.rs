//! Stop request / stop acknowledgment pair between the process shell and the
//! scan loop.

use tokio::sync::{oneshot, watch};

use crate::error::{Result, WatchError};

/// Held by the foreground task
pub struct ShutdownHandle {
    cancel: watch::Sender<bool>,
    stopped: oneshot::Receiver<()>,
}

/// Held by the scan loop
pub struct ShutdownListener {
    cancel: watch::Receiver<bool>,
    stopped: oneshot::Sender<()>,
}

pub fn shutdown_channel() -> (ShutdownHandle, ShutdownListener) {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (stopped_tx, stopped_rx) = oneshot::channel();
    (
        ShutdownHandle {
            cancel: cancel_tx,
            stopped: stopped_rx,
        },
        ShutdownListener {
            cancel: cancel_rx,
            stopped: stopped_tx,
        },
    )
}

impl ShutdownHandle {
    /// Ask the loop to stop without waiting for it
    pub fn cancel(&self) {
        // Err only means the listener is already gone
        let _ = self.cancel.send(true);
    }

    /// Ask the loop to stop and wait until it says it has
    pub async fn shutdown(self) -> Result<()> {
        self.cancel();
        self.stopped.await.map_err(|_| {
            WatchError::Shutdown("scan loop exited without acknowledging".to_string())
        })
    }
}

impl ShutdownListener {
    /// A dropped handle counts as a stop request
    pub fn is_cancelled(&self) -> bool {
        let requested = *self.cancel.borrow();
        requested || self.cancel.has_changed().is_err()
    }

    pub fn acknowledge(self) {
        let _ = self.stopped.send(());
    }
}
