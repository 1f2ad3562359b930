//! One push connection's outbound queue.

use escrowmatch_types::{ChannelId, OutboundEvent};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Result of a single non-blocking enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Queued,
    /// The queue is at capacity; the event was dropped.
    Full,
    /// The receiving side is gone; the connection has ended.
    Closed,
}

/// Cloneable sending half of a connection's bounded event queue.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    id: ChannelId,
    tx: mpsc::Sender<OutboundEvent>,
}

impl ChannelHandle {
    /// Open a new queue of `capacity` events.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn open(capacity: usize) -> (Self, mpsc::Receiver<OutboundEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                id: ChannelId::new(),
                tx,
            },
            rx,
        )
    }

    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Enqueue without waiting.
    pub fn try_deliver(&self, event: OutboundEvent) -> SendOutcome {
        match self.tx.try_send(event) {
            Ok(()) => SendOutcome::Queued,
            Err(TrySendError::Full(_)) => SendOutcome::Full,
            Err(TrySendError::Closed(_)) => SendOutcome::Closed,
        }
    }

    /// `true` once the receiving half has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use escrowmatch_types::Order;

    use super::*;

    fn event() -> OutboundEvent {
        OutboundEvent::new_order(&Order::dummy_pending())
    }

    #[test]
    fn queued_then_full() {
        let (handle, mut rx) = ChannelHandle::open(1);
        assert_eq!(handle.try_deliver(event()), SendOutcome::Queued);
        assert_eq!(handle.try_deliver(event()), SendOutcome::Full);
        assert!(rx.try_recv().is_ok());
        assert_eq!(handle.try_deliver(event()), SendOutcome::Queued);
    }

    #[test]
    fn closed_after_receiver_drop() {
        let (handle, rx) = ChannelHandle::open(4);
        drop(rx);
        assert!(handle.is_closed());
        assert_eq!(handle.try_deliver(event()), SendOutcome::Closed);
    }

    #[test]
    fn each_open_gets_a_fresh_id() {
        let (a, _ra) = ChannelHandle::open(1);
        let (b, _rb) = ChannelHandle::open(1);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }
}
