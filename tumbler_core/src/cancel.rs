//! Cooperative cancellation for the dissociation cycle.
//!
//! A `Canceller` can be cloned into signal handlers or other threads; the
//! controller owns the matching `CancelToken` and polls it once before each
//! tumble. Cancellation is latched: once seen, the token stays cancelled.
//! Dropping every `Canceller` does not cancel.
use crossbeam_channel as xch;
use std::cell::Cell;

/// Create a connected canceller/token pair.
pub fn cancel_pair() -> (Canceller, CancelToken) {
    let (tx, rx) = xch::bounded(1);
    (
        Canceller { tx },
        CancelToken {
            rx,
            seen: Cell::new(false),
        },
    )
}

#[derive(Debug, Clone)]
pub struct Canceller {
    tx: xch::Sender<()>,
}

impl Canceller {
    /// Request cancellation. Repeated calls are harmless.
    pub fn cancel(&self) {
        // Full channel means a request is already pending.
        let _ = self.tx.try_send(());
    }
}

#[derive(Debug)]
pub struct CancelToken {
    rx: xch::Receiver<()>,
    seen: Cell<bool>,
}

impl CancelToken {
    /// Non-blocking poll.
    pub fn is_cancelled(&self) -> bool {
        if self.seen.get() {
            return true;
        }
        if self.rx.try_recv().is_ok() {
            self.seen.set(true);
        }
        self.seen.get()
    }
}
