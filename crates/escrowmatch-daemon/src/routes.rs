//! Axum router and HTTP handlers.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers, so tests can drive the bare router.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State, rejection::JsonRejection},
    http::request::Parts,
    routing::{get, post},
};
use escrowmatch_types::{
    Caller, EscrowError, Order, OrderId, PendingOrderView, Role, constants, parse_fiat_amount,
};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    api_types::{Ack, CreateOrderRequest, CreateOrderResponse, HealthResponse, SubmitProofRequest},
    error::ApiError,
    state::AppState,
    ws,
};

/// Header carrying the authenticated party's UUID.
pub const CALLER_ID_HEADER: &str = "x-caller-id";
/// Header carrying `user` or `merchant`.
pub const CALLER_ROLE_HEADER: &str = "x-caller-role";

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/orders", post(create_order))
        .route("/v1/orders/pending", get(list_pending))
        .route("/v1/orders/:id", get(get_order))
        .route("/v1/orders/:id/accept", post(accept_order))
        .route("/v1/orders/:id/proof", post(submit_proof))
        .route("/v1/orders/:id/verify", post(verify_order))
        .route("/v1/ws", get(ws::upgrade))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Caller identity
// ---------------------------------------------------------------------------

/// The caller as asserted by the upstream identity proxy.
///
/// Rejects with 401 when either header is missing or malformed.
pub struct AuthCaller(pub Caller);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id: Uuid = header(parts, CALLER_ID_HEADER)?
            .parse()
            .map_err(|_| ApiError::unauthenticated(format!("malformed {CALLER_ID_HEADER}")))?;
        let role: Role = header(parts, CALLER_ROLE_HEADER)?
            .parse()
            .map_err(|_| ApiError::unauthenticated(format!("malformed {CALLER_ROLE_HEADER}")))?;

        Ok(Self(Caller { id, role }))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .ok_or_else(|| ApiError::unauthenticated(format!("missing {name} header")))
}

fn order_id(raw: &str) -> Result<OrderId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("malformed order id '{raw}'")))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Accept `fiatAmount` as a JSON number or a decimal string.
fn fiat_amount(value: &Value) -> Result<Decimal, EscrowError> {
    match value {
        Value::Number(n) => parse_fiat_amount(&n.to_string()),
        Value::String(s) => parse_fiat_amount(s),
        other => Err(EscrowError::InvalidAmount {
            reason: format!("expected a number, got {other}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: st.build.service.to_string(),
        version: st.build.version.to_string(),
        online_merchants: st.service.registry().online_merchant_count(),
        accept_window_secs: constants::ADVERTISED_ACCEPT_WINDOW_SECS,
        dispute_window_hours: constants::ADVERTISED_DISPUTE_WINDOW_HOURS,
    })
}

// ---------------------------------------------------------------------------
// POST /v1/orders
// ---------------------------------------------------------------------------

pub(crate) async fn create_order(
    State(st): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ApiResult<CreateOrderResponse> {
    let req = body(payload)?;
    let amount = fiat_amount(&req.fiat_amount)?;
    let order_id = st.service.create_order(&caller, amount).await?;
    Ok(Json(CreateOrderResponse {
        order_id,
        accept_window_secs: constants::ADVERTISED_ACCEPT_WINDOW_SECS,
    }))
}

// ---------------------------------------------------------------------------
// GET /v1/orders/pending
// ---------------------------------------------------------------------------

pub(crate) async fn list_pending(
    State(st): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
) -> ApiResult<Vec<PendingOrderView>> {
    Ok(Json(st.service.list_pending_orders(&caller).await?))
}

// ---------------------------------------------------------------------------
// GET /v1/orders/:id
// ---------------------------------------------------------------------------

pub(crate) async fn get_order(
    State(st): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(raw): Path<String>,
) -> ApiResult<Order> {
    let id = order_id(&raw)?;
    Ok(Json(st.service.get_order(&caller, id).await?))
}

// ---------------------------------------------------------------------------
// POST /v1/orders/:id/accept
// ---------------------------------------------------------------------------

pub(crate) async fn accept_order(
    State(st): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(raw): Path<String>,
) -> ApiResult<Ack> {
    let id = order_id(&raw)?;
    st.service.accept_order(&caller, id).await?;
    Ok(Json(Ack {}))
}

// ---------------------------------------------------------------------------
// POST /v1/orders/:id/proof
// ---------------------------------------------------------------------------

pub(crate) async fn submit_proof(
    State(st): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(raw): Path<String>,
    payload: Result<Json<SubmitProofRequest>, JsonRejection>,
) -> ApiResult<Ack> {
    let id = order_id(&raw)?;
    let req = body(payload)?;
    st.service
        .submit_proof(&caller, id, req.proof_reference)
        .await?;
    Ok(Json(Ack {}))
}

// ---------------------------------------------------------------------------
// POST /v1/orders/:id/verify
// ---------------------------------------------------------------------------

pub(crate) async fn verify_order(
    State(st): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(raw): Path<String>,
) -> ApiResult<Ack> {
    let id = order_id(&raw)?;
    st.service.verify_order(&caller, id).await?;
    Ok(Json(Ack {}))
}
