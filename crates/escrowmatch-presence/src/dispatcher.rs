//! Best-effort fan-out of lifecycle events.

use std::sync::Arc;

use escrowmatch_types::{ChannelId, MerchantId, OutboundEvent, UserId};

use crate::{ChannelHandle, PresenceRegistry, SendOutcome};

/// What happened to one fan-out. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Events enqueued on a live channel.
    pub delivered: usize,
    /// Events dropped because a queue was full.
    pub dropped: usize,
    /// Channels found closed and pruned from the registry.
    pub pruned: usize,
}

impl DeliveryReport {
    /// `true` if the event reached no channel at all.
    #[must_use]
    pub fn missed(&self) -> bool {
        self.delivered == 0
    }
}

/// Delivers [`OutboundEvent`]s to the live channels of the given parties.
///
/// Channel handles are cloned out of the registry and the lock released
/// before anything is enqueued.
#[derive(Clone)]
pub struct BroadcastDispatcher {
    registry: Arc<PresenceRegistry>,
}

impl BroadcastDispatcher {
    #[must_use]
    pub fn new(registry: Arc<PresenceRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        &self.registry
    }

    /// Deliver `event` to every open channel of every merchant in `merchant_ids`.
    pub fn notify_merchants(&self, merchant_ids: &[MerchantId], event: &OutboundEvent) -> DeliveryReport {
        let targets = self.registry.merchant_channels(merchant_ids);
        let (report, closed) = fan_out(targets, event);
        for (merchant_id, channel_id) in closed {
            self.registry.channel_closed(merchant_id, channel_id);
        }
        log_report("merchants", merchant_ids.len(), event, report);
        report
    }

    /// Deliver `event` to one merchant's open channels.
    pub fn notify_merchant(&self, merchant_id: MerchantId, event: &OutboundEvent) -> DeliveryReport {
        self.notify_merchants(&[merchant_id], event)
    }

    /// Deliver `event` to the user's open channels.
    pub fn notify_user(&self, user_id: UserId, event: &OutboundEvent) -> DeliveryReport {
        let targets = self.registry.user_channels(user_id);
        let (report, closed) = fan_out(targets, event);
        for (user_id, channel_id) in closed {
            self.registry.user_channel_closed(user_id, channel_id);
        }
        log_report("user", 1, event, report);
        report
    }
}

fn fan_out<K: Copy>(
    targets: Vec<(K, ChannelHandle)>,
    event: &OutboundEvent,
) -> (DeliveryReport, Vec<(K, ChannelId)>) {
    let mut report = DeliveryReport::default();
    let mut closed = Vec::new();
    for (party, channel) in targets {
        match channel.try_deliver(event.clone()) {
            SendOutcome::Queued => report.delivered += 1,
            SendOutcome::Full => {
                report.dropped += 1;
                tracing::warn!(
                    channel_id = %channel.id(),
                    event = event.name(),
                    order_id = %event.order_id(),
                    "outbound queue full, event dropped"
                );
            }
            SendOutcome::Closed => {
                report.pruned += 1;
                closed.push((party, channel.id()));
            }
        }
    }
    (report, closed)
}

fn log_report(audience: &str, recipients: usize, event: &OutboundEvent, report: DeliveryReport) {
    tracing::debug!(
        audience,
        recipients,
        event = event.name(),
        order_id = %event.order_id(),
        delivered = report.delivered,
        dropped = report.dropped,
        pruned = report.pruned,
        "event dispatched"
    );
}

#[cfg(test)]
mod tests {
    use escrowmatch_types::Order;

    use super::*;

    fn setup() -> (Arc<PresenceRegistry>, BroadcastDispatcher) {
        let reg = Arc::new(PresenceRegistry::new());
        let dispatcher = BroadcastDispatcher::new(Arc::clone(&reg));
        (reg, dispatcher)
    }

    #[test]
    fn reaches_every_channel_of_each_merchant() {
        let (reg, dispatcher) = setup();
        let a = MerchantId::new();
        let b = MerchantId::new();
        let (a1, mut a1_rx) = ChannelHandle::open(4);
        let (a2, mut a2_rx) = ChannelHandle::open(4);
        let (b1, mut b1_rx) = ChannelHandle::open(4);
        reg.mark_online(a, a1);
        reg.mark_online(a, a2);
        reg.mark_online(b, b1);

        let event = OutboundEvent::new_order(&Order::dummy_pending());
        let report = dispatcher.notify_merchants(&[a, b], &event);
        assert_eq!(report.delivered, 3);
        assert_eq!(a1_rx.try_recv().unwrap(), event);
        assert_eq!(a2_rx.try_recv().unwrap(), event);
        assert_eq!(b1_rx.try_recv().unwrap(), event);
    }

    #[test]
    fn full_queue_drops_without_error() {
        let (reg, dispatcher) = setup();
        let m = MerchantId::new();
        let (ch, mut rx) = ChannelHandle::open(1);
        reg.mark_online(m, ch);

        let event = OutboundEvent::new_order(&Order::dummy_pending());
        assert_eq!(dispatcher.notify_merchant(m, &event).delivered, 1);
        let report = dispatcher.notify_merchant(m, &event);
        assert_eq!(report.dropped, 1);
        assert!(report.missed());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert!(reg.is_online(m), "a slow consumer is not a disconnect");
    }

    #[test]
    fn closed_channel_is_pruned() {
        let (reg, dispatcher) = setup();
        let m = MerchantId::new();
        let (ch, rx) = ChannelHandle::open(4);
        reg.mark_online(m, ch);
        drop(rx);

        let event = OutboundEvent::new_order(&Order::dummy_pending());
        let report = dispatcher.notify_merchant(m, &event);
        assert_eq!(report.pruned, 1);
        assert!(!reg.is_online(m));
    }

    #[test]
    fn user_without_channels_misses_silently() {
        let (_reg, dispatcher) = setup();
        let order = Order::dummy_pending();
        let event = OutboundEvent::order_accepted(order.id, MerchantId::new());
        let report = dispatcher.notify_user(order.requester_id, &event);
        assert!(report.missed());
    }

    #[test]
    fn user_notification_reaches_only_that_user() {
        let (reg, dispatcher) = setup();
        let alice = UserId::new();
        let bob = UserId::new();
        let (a, mut a_rx) = ChannelHandle::open(4);
        let (b, mut b_rx) = ChannelHandle::open(4);
        reg.attach_user(alice, a);
        reg.attach_user(bob, b);

        let event = OutboundEvent::proof_submitted(Order::dummy_pending().id, "proof://abc");
        dispatcher.notify_user(alice, &event);
        assert_eq!(a_rx.try_recv().unwrap(), event);
        assert!(b_rx.try_recv().is_err());
    }
}
