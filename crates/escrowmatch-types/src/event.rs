//! Push-channel wire messages.
//!
//! [`OutboundEvent`]s flow from the engine to connected parties;
//! [`InboundSignal`]s flow from a connection to the presence registry.
//! Both serialize as internally tagged JSON: `{"type":"newOrder", ...}`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MerchantId, Order, OrderId};

/// Lifecycle notifications delivered best-effort to live channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutboundEvent {
    /// Broadcast to every merchant online at creation time.
    NewOrder {
        order_id: OrderId,
        fiat_amount: Decimal,
        crypto_amount: Decimal,
    },
    /// To the requester, once a merchant wins the order.
    OrderAccepted {
        order_id: OrderId,
        merchant_id: MerchantId,
    },
    /// To the requester, once the merchant attaches proof of payment.
    ProofSubmitted {
        order_id: OrderId,
        proof_reference: String,
    },
    /// To the assigned merchant, once the requester releases escrow.
    OrderVerified {
        order_id: OrderId,
        crypto_amount: Decimal,
    },
}

impl OutboundEvent {
    #[must_use]
    pub fn new_order(order: &Order) -> Self {
        Self::NewOrder {
            order_id: order.id,
            fiat_amount: order.fiat_amount,
            crypto_amount: order.crypto_amount,
        }
    }

    #[must_use]
    pub fn order_accepted(order_id: OrderId, merchant_id: MerchantId) -> Self {
        Self::OrderAccepted {
            order_id,
            merchant_id,
        }
    }

    #[must_use]
    pub fn proof_submitted(order_id: OrderId, proof_reference: impl Into<String>) -> Self {
        Self::ProofSubmitted {
            order_id,
            proof_reference: proof_reference.into(),
        }
    }

    #[must_use]
    pub fn order_verified(order: &Order) -> Self {
        Self::OrderVerified {
            order_id: order.id,
            crypto_amount: order.crypto_amount,
        }
    }

    /// Wire name, as found in the `type` tag.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewOrder { .. } => "newOrder",
            Self::OrderAccepted { .. } => "orderAccepted",
            Self::ProofSubmitted { .. } => "proofSubmitted",
            Self::OrderVerified { .. } => "orderVerified",
        }
    }

    #[must_use]
    pub fn order_id(&self) -> OrderId {
        match self {
            Self::NewOrder { order_id, .. }
            | Self::OrderAccepted { order_id, .. }
            | Self::ProofSubmitted { order_id, .. }
            | Self::OrderVerified { order_id, .. } => *order_id,
        }
    }
}

/// Presence signals a connection may send.
///
/// The sender's identity is never part of the frame; it comes from the
/// authenticated connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundSignal {
    MerchantOnline,
    MerchantOffline,
    UserOnline,
}
