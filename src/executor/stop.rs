use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::{info, warn};

/// Shared, write-once stop flag. Workers read it at the top of every loop
/// iteration; sleepers can await it.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Resolves once [`StopSignal::stop`] has been called.
    pub async fn stopped(&self) {
        loop {
            // Register before checking so a concurrent stop() cannot slip between.
            let notified = self.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// One signal: the run drains and reports as usual.
    Graceful,
    /// A second signal arrived while draining.
    Forced,
}

/// Turns interrupt signals delivered on `signals` into stop requests. The
/// first one stops `stop` gracefully; a second one returns
/// [`Interrupt::Forced`]. Returns `None` if the source closes before any signal.
pub async fn watch_interrupts(
    stop: &StopSignal,
    signals: &mut mpsc::Receiver<()>,
) -> Option<Interrupt> {
    signals.recv().await?;
    info!("Received interrupt signal, stopping test...");
    stop.stop();

    match signals.recv().await {
        Some(()) => {
            warn!("Received second interrupt signal, exiting without waiting for drain");
            Some(Interrupt::Forced)
        }
        None => Some(Interrupt::Graceful),
    }
}
