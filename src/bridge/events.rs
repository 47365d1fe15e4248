//! Event loop input
//!
//! Cancellation is posted into the queue rather than acted on where it is
//! raised; the event loop consumes it and runs the shutdown itself.

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::gatt::traits::Notification;

/// Events consumed by the bridge event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Value pushed by the peripheral
    Notification(Notification),
    /// Stop request (Ctrl+C or similar)
    Cancel,
}

/// Posts cancellation requests; cheap to clone
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: UnboundedSender<BridgeEvent>,
}

impl Canceller {
    /// Request shutdown. Safe to call any number of times, from any thread.
    pub fn cancel(&self) {
        // Receiver gone means the loop already exited
        let _ = self.tx.unbounded_send(BridgeEvent::Cancel);
    }
}

/// Receiving end handed to the event loop
pub type EventQueue = UnboundedReceiver<BridgeEvent>;

/// Create a connected canceller / queue pair
pub fn event_channel() -> (Canceller, EventQueue) {
    let (tx, rx) = mpsc::unbounded();
    (Canceller { tx }, rx)
}
