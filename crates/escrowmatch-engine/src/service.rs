//! Role-gated boundary over the engine and the presence registry.
//!
//! Transports authenticate the connection and hand a [`Caller`] to every
//! call. Role checks happen here, before the engine sees the request;
//! ownership checks (assigned merchant, requester) happen in the state
//! transition itself.

use std::sync::Arc;

use escrowmatch_presence::{ChannelHandle, PresenceRegistry};
use escrowmatch_types::{
    Caller, ChannelId, EscrowError, InboundSignal, MerchantId, Order, OrderId, OutboundEvent,
    PendingOrderView, Result, Role, UserId,
};
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use crate::LifecycleEngine;

#[derive(Clone)]
pub struct EscrowService {
    engine: Arc<LifecycleEngine>,
}

impl EscrowService {
    #[must_use]
    pub fn new(engine: Arc<LifecycleEngine>) -> Self {
        Self { engine }
    }

    #[must_use]
    pub fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        self.engine.registry()
    }

    // -----------------------------------------------------------------
    // Order operations
    // -----------------------------------------------------------------

    /// # Errors
    /// `RoleDenied` for merchants; otherwise as [`LifecycleEngine::create_order`].
    pub async fn create_order(&self, caller: &Caller, fiat_amount: Decimal) -> Result<OrderId> {
        let user = caller.require_user()?;
        self.engine.create_order(user, fiat_amount).await
    }

    /// # Errors
    /// `RoleDenied` for users; otherwise as [`LifecycleEngine::accept_order`].
    pub async fn accept_order(&self, caller: &Caller, order_id: OrderId) -> Result<Order> {
        let merchant = caller.require_merchant()?;
        self.engine.accept_order(order_id, merchant).await
    }

    /// # Errors
    /// `RoleDenied` for users; otherwise as [`LifecycleEngine::submit_proof`].
    pub async fn submit_proof(
        &self,
        caller: &Caller,
        order_id: OrderId,
        proof_reference: impl Into<String>,
    ) -> Result<Order> {
        let merchant = caller.require_merchant()?;
        self.engine
            .submit_proof(order_id, merchant, proof_reference)
            .await
    }

    /// # Errors
    /// `RoleDenied` for merchants; otherwise as [`LifecycleEngine::verify_order`].
    pub async fn verify_order(&self, caller: &Caller, order_id: OrderId) -> Result<Order> {
        let user = caller.require_user()?;
        self.engine.verify_order(order_id, user).await
    }

    /// The pending book is visible to merchants only.
    ///
    /// # Errors
    /// `RoleDenied` for users.
    pub async fn list_pending_orders(&self, caller: &Caller) -> Result<Vec<PendingOrderView>> {
        caller.require_merchant()?;
        self.engine.list_pending_orders().await
    }

    /// Full order record, for its requester or assigned merchant.
    ///
    /// # Errors
    /// `OrderNotFound`, or `NotOrderParticipant` for anyone else.
    pub async fn get_order(&self, caller: &Caller, order_id: OrderId) -> Result<Order> {
        let order = self.engine.get_order(order_id).await?;
        if order.is_participant(caller.id) {
            Ok(order)
        } else {
            Err(EscrowError::NotOrderParticipant(order_id))
        }
    }

    // -----------------------------------------------------------------
    // Presence
    // -----------------------------------------------------------------

    /// A fresh outbound queue sized by the engine config.
    #[must_use]
    pub fn open_channel(&self) -> (ChannelHandle, mpsc::Receiver<OutboundEvent>) {
        ChannelHandle::open(self.engine.config().channel_capacity)
    }

    /// Apply a presence signal received on `channel`.
    ///
    /// # Errors
    /// `RoleDenied` when the signal does not match the caller's role.
    pub fn signal(&self, caller: &Caller, signal: InboundSignal, channel: &ChannelHandle) -> Result<()> {
        let registry = self.registry();
        match signal {
            InboundSignal::MerchantOnline => {
                registry.mark_online(caller.require_merchant()?, channel.clone());
            }
            InboundSignal::MerchantOffline => {
                registry.mark_offline(caller.require_merchant()?);
            }
            InboundSignal::UserOnline => {
                registry.attach_user(caller.require_user()?, channel.clone());
            }
        }
        Ok(())
    }

    /// The transport connection carrying `channel_id` has ended.
    pub fn connection_closed(&self, caller: &Caller, channel_id: ChannelId) {
        let registry = self.registry();
        match caller.role {
            Role::Merchant => {
                registry.channel_closed(MerchantId(caller.id), channel_id);
            }
            Role::User => {
                registry.user_channel_closed(UserId(caller.id), channel_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use escrowmatch_store::MemoryOrderStore;
    use escrowmatch_types::{EngineConfig, OrderStatus};

    use super::*;
    use crate::FixedQuoteSource;

    fn service() -> EscrowService {
        let engine = LifecycleEngine::new(
            Arc::new(MemoryOrderStore::new()),
            Arc::new(FixedQuoteSource::new(Decimal::new(20, 0))),
            Arc::new(PresenceRegistry::new()),
            EngineConfig::default(),
        )
        .unwrap();
        EscrowService::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn roles_are_enforced() {
        let svc = service();
        let user = Caller::user(UserId::new());
        let merchant = Caller::merchant(MerchantId::new());

        assert!(matches!(
            svc.create_order(&merchant, Decimal::ONE_HUNDRED).await,
            Err(EscrowError::RoleDenied { .. })
        ));
        let id = svc.create_order(&user, Decimal::ONE_HUNDRED).await.unwrap();

        assert!(matches!(
            svc.accept_order(&user, id).await,
            Err(EscrowError::RoleDenied { .. })
        ));
        assert!(matches!(
            svc.list_pending_orders(&user).await,
            Err(EscrowError::RoleDenied { .. })
        ));
        assert!(matches!(
            svc.submit_proof(&user, id, "p").await,
            Err(EscrowError::RoleDenied { .. })
        ));
        assert!(matches!(
            svc.verify_order(&merchant, id).await,
            Err(EscrowError::RoleDenied { .. })
        ));
        assert_eq!(svc.list_pending_orders(&merchant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_order_is_participant_only() {
        let svc = service();
        let user = Caller::user(UserId::new());
        let merchant = Caller::merchant(MerchantId::new());
        let stranger = Caller::user(UserId::new());

        let id = svc.create_order(&user, Decimal::ONE_HUNDRED).await.unwrap();
        assert!(svc.get_order(&user, id).await.is_ok());
        assert!(matches!(
            svc.get_order(&merchant, id).await,
            Err(EscrowError::NotOrderParticipant(_))
        ));

        svc.accept_order(&merchant, id).await.unwrap();
        assert_eq!(
            svc.get_order(&merchant, id).await.unwrap().status,
            OrderStatus::Accepted
        );
        assert!(matches!(
            svc.get_order(&stranger, id).await,
            Err(EscrowError::NotOrderParticipant(_))
        ));
    }

    #[test]
    fn signals_follow_roles() {
        let svc = service();
        let merchant_id = MerchantId::new();
        let merchant = Caller::merchant(merchant_id);
        let user = Caller::user(UserId::new());
        let (ch, _rx) = svc.open_channel();

        assert!(matches!(
            svc.signal(&user, InboundSignal::MerchantOnline, &ch),
            Err(EscrowError::RoleDenied { .. })
        ));
        assert!(matches!(
            svc.signal(&merchant, InboundSignal::UserOnline, &ch),
            Err(EscrowError::RoleDenied { .. })
        ));

        svc.signal(&merchant, InboundSignal::MerchantOnline, &ch).unwrap();
        assert!(svc.registry().is_online(merchant_id));
        svc.connection_closed(&merchant, ch.id());
        assert!(!svc.registry().is_online(merchant_id));
    }

    #[test]
    fn merchant_offline_drops_every_connection() {
        let svc = service();
        let merchant_id = MerchantId::new();
        let merchant = Caller::merchant(merchant_id);
        let (a, _ra) = svc.open_channel();
        let (b, _rb) = svc.open_channel();
        svc.signal(&merchant, InboundSignal::MerchantOnline, &a).unwrap();
        svc.signal(&merchant, InboundSignal::MerchantOnline, &b).unwrap();
        assert_eq!(svc.registry().merchant_channel_count(merchant_id), 2);

        svc.signal(&merchant, InboundSignal::MerchantOffline, &a).unwrap();
        assert!(!svc.registry().is_online(merchant_id));
    }
}
