use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::{Receiver, Sender};
use tokio::sync::Mutex;

/// Signals every listener that the run should stop starting new work.
///
/// Once [ShutdownHandle::shutdown] has been called the signal stays raised, so listeners created
/// or polled after the fact still observe it.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::broadcast::channel(1).0,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown(&self) {
        if self.triggered.swap(true, Ordering::AcqRel) {
            log::debug!("Shutdown already requested");
            return;
        }

        if let Err(e) = self.sender.send(()) {
            // Will fail if nobody is waiting on the signal, which is fine because polling
            // listeners read the flag instead.
            log::trace!("No async listeners for shutdown signal: {e:?}");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    pub fn new_listener(&self) -> DelegatedShutdownListener {
        DelegatedShutdownListener::new(self.sender.subscribe(), self.triggered.clone())
    }
}

#[derive(Clone, Debug)]
pub struct DelegatedShutdownListener {
    receiver: Arc<Mutex<Receiver<()>>>,
    triggered: Arc<AtomicBool>,
}

impl DelegatedShutdownListener {
    pub(crate) fn new(receiver: Receiver<()>, triggered: Arc<AtomicBool>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
            triggered,
        }
    }

    /// Point in time check if the shutdown signal has been raised. If this returns true then no
    /// new work should be started so that the run can wind down.
    pub fn should_shutdown(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Wait for the shutdown signal. It is safe to race this with another future so that the
    /// signal can be used to stop background work such as timers.
    pub async fn wait_for_shutdown(&mut self) {
        if self.should_shutdown() {
            return;
        }

        // Any outcome here means the signal was sent or the handle is gone.
        let _ = self.receiver.lock().await.recv().await;
    }
}
