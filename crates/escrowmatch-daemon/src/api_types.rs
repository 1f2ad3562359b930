//! Request and response bodies for the daemon's HTTP endpoints.
//!
//! `Serialize + Deserialize` so tests can decode what the router encodes.
//! No business logic lives here.

use escrowmatch_types::OrderId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    /// Merchants currently reachable for broadcasts.
    pub online_merchants: usize,
    /// Advisory only; no order expires.
    pub accept_window_secs: u64,
    /// Advisory only; no dispute flow exists.
    pub dispute_window_hours: u64,
}

// ---------------------------------------------------------------------------
// /v1/orders
// ---------------------------------------------------------------------------

/// `fiatAmount` may be a JSON number or a decimal string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub fiat_amount: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: OrderId,
    /// How long the client should wait for a merchant. Not enforced.
    pub accept_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProofRequest {
    pub proof_reference: String,
}

/// Empty success body, `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Code-prefixed human-readable message.
    pub error: String,
    /// `EM_ERR_xxx`.
    pub code: String,
}
