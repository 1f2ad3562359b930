//! The lifecycle engine.
//!
//! Every operation follows the same shape: validate the request, commit at
//! most one transition through [`OrderStore::apply_transition`], then fan out
//! the resulting event. A failed operation never notifies anyone, and a
//! failed notification never fails the operation.

use std::sync::Arc;

use escrowmatch_presence::{BroadcastDispatcher, PresenceRegistry};
use escrowmatch_store::OrderStore;
use escrowmatch_types::{
    EngineConfig, EscrowError, MerchantId, Order, OrderId, OrderStatus, OrderTransition,
    OutboundEvent, PendingOrderView, Quote, Result, UserId, validate_fiat_amount,
};
use rust_decimal::Decimal;

use crate::QuoteSource;

pub struct LifecycleEngine {
    store: Arc<dyn OrderStore>,
    quotes: Arc<dyn QuoteSource>,
    dispatcher: BroadcastDispatcher,
    config: EngineConfig,
}

impl LifecycleEngine {
    /// # Errors
    /// Returns `Configuration` if `config` fails validation.
    pub fn new(
        store: Arc<dyn OrderStore>,
        quotes: Arc<dyn QuoteSource>,
        registry: Arc<PresenceRegistry>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            quotes,
            dispatcher: BroadcastDispatcher::new(registry),
            config,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        self.dispatcher.registry()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------

    /// Price and store a new pending order, then announce it to every
    /// merchant online at this instant.
    ///
    /// # Errors
    /// `InvalidAmount` for a non-positive amount, `QuoteUnavailable` if the
    /// quote fails or exceeds the configured timeout. No order is stored in
    /// either case.
    pub async fn create_order(&self, requester_id: UserId, fiat_amount: Decimal) -> Result<OrderId> {
        validate_fiat_amount(fiat_amount)?;

        let quote = self.fetch_quote().await?;
        let crypto_amount = quote.crypto_for_fiat(fiat_amount, self.config.crypto_scale)?;

        let order = Order::new(requester_id, fiat_amount, crypto_amount);
        let order_id = order.id;
        let event = OutboundEvent::new_order(&order);
        self.store.insert(order).await?;

        let online = self.registry().snapshot_online_merchants();
        let report = self.dispatcher.notify_merchants(&online, &event);

        tracing::info!(
            %order_id,
            %requester_id,
            %fiat_amount,
            %crypto_amount,
            fiat = %self.config.fiat_currency,
            asset = %self.config.crypto_asset,
            rate = %quote.fiat_per_unit,
            merchants = online.len(),
            delivered = report.delivered,
            "order created"
        );
        Ok(order_id)
    }

    async fn fetch_quote(&self) -> Result<Quote> {
        let timeout = self.config.quote_timeout();
        match tokio::time::timeout(timeout, self.quotes.current_quote()).await {
            Ok(Ok(quote)) => Ok(quote),
            Ok(Err(err @ EscrowError::QuoteUnavailable { .. })) => {
                tracing::warn!(error = %err, "quote fetch failed");
                Err(err)
            }
            Ok(Err(other)) => {
                tracing::warn!(error = %other, "quote fetch failed");
                Err(EscrowError::QuoteUnavailable {
                    reason: other.to_string(),
                })
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.config.quote_timeout_ms, "quote fetch timed out");
                Err(EscrowError::QuoteUnavailable {
                    reason: format!("no quote within {}ms", self.config.quote_timeout_ms),
                })
            }
        }
    }

    // -----------------------------------------------------------------
    // Accept
    // -----------------------------------------------------------------

    /// Claim a pending order. Exactly one of any number of concurrent
    /// callers succeeds; the rest get `OrderNotAcceptable`.
    ///
    /// # Errors
    /// `OrderNotFound`, or `OrderNotAcceptable` if the order is no longer
    /// pending.
    pub async fn accept_order(&self, order_id: OrderId, merchant_id: MerchantId) -> Result<Order> {
        let order = self
            .commit(order_id, OrderTransition::Accept { merchant_id })
            .await?;

        let report = self
            .dispatcher
            .notify_user(order.requester_id, &OutboundEvent::order_accepted(order_id, merchant_id));
        tracing::info!(%order_id, %merchant_id, delivered = report.delivered, "order accepted");
        Ok(order)
    }

    // -----------------------------------------------------------------
    // Proof
    // -----------------------------------------------------------------

    /// Attach the assigned merchant's payment proof. Accepted once.
    ///
    /// # Errors
    /// `OrderNotFound`, `NotAssignedMerchant`, `InvalidState` if the order is
    /// not accepted or already carries a proof, `InvalidProofReference` for
    /// a blank or oversized reference.
    pub async fn submit_proof(
        &self,
        order_id: OrderId,
        merchant_id: MerchantId,
        proof_reference: impl Into<String>,
    ) -> Result<Order> {
        let transition = OrderTransition::AttachProof {
            merchant_id,
            proof_reference: proof_reference.into(),
        };
        let order = self.commit(order_id, transition).await?;

        if let Some(proof) = &order.proof_reference {
            let report = self
                .dispatcher
                .notify_user(order.requester_id, &OutboundEvent::proof_submitted(order_id, proof.as_str()));
            tracing::info!(%order_id, %merchant_id, delivered = report.delivered, "proof submitted");
        }
        Ok(order)
    }

    // -----------------------------------------------------------------
    // Verify
    // -----------------------------------------------------------------

    /// The requester confirms fiat receipt; the order completes.
    ///
    /// # Errors
    /// `OrderNotFound`, `NotRequester`, or `InvalidState` unless the order is
    /// accepted with a proof attached.
    pub async fn verify_order(&self, order_id: OrderId, requester_id: UserId) -> Result<Order> {
        let order = self
            .commit(order_id, OrderTransition::Complete { requester_id })
            .await?;

        match order.merchant_id {
            Some(merchant_id) => {
                let report = self
                    .dispatcher
                    .notify_merchant(merchant_id, &OutboundEvent::order_verified(&order));
                tracing::info!(
                    %order_id,
                    %requester_id,
                    %merchant_id,
                    crypto_amount = %order.crypto_amount,
                    delivered = report.delivered,
                    "order verified, release crypto"
                );
            }
            None => tracing::error!(%order_id, "completed order has no merchant"),
        }
        Ok(order)
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Pending orders, oldest first.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn list_pending_orders(&self) -> Result<Vec<PendingOrderView>> {
        let pending = self.store.list_by_status(OrderStatus::Pending).await?;
        Ok(pending.iter().map(Order::pending_view).collect())
    }

    /// # Errors
    /// `OrderNotFound` if no such order exists.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.store.get(order_id).await
    }

    async fn commit(&self, order_id: OrderId, transition: OrderTransition) -> Result<Order> {
        self.store
            .apply_transition(order_id, &transition)
            .await
            .inspect_err(|err| {
                tracing::warn!(%order_id, transition = transition.name(), error = %err, "transition rejected");
            })
    }
}
