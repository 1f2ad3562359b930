//! In-process tests for the daemon's HTTP endpoints.
//!
//! The router is driven through `tower::ServiceExt::oneshot`; no socket is
//! bound.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use escrowmatch_daemon::{
    routes::{self, CALLER_ID_HEADER, CALLER_ROLE_HEADER},
    state::AppState,
};
use escrowmatch_engine::FixedQuoteSource;
use escrowmatch_types::{EngineConfig, MerchantId, OutboundEvent, UserId};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_state() -> Arc<AppState> {
    Arc::new(
        AppState::in_memory(
            Arc::new(FixedQuoteSource::new(Decimal::new(20, 0))),
            EngineConfig::default(),
        )
        .unwrap(),
    )
}

#[derive(Clone, Copy)]
enum As {
    User(Uuid),
    Merchant(Uuid),
    Nobody,
}

fn request(method: &str, uri: &str, who: As, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    match who {
        As::User(id) => {
            builder = builder
                .header(CALLER_ID_HEADER, id.to_string())
                .header(CALLER_ROLE_HEADER, "user");
        }
        As::Merchant(id) => {
            builder = builder
                .header(CALLER_ID_HEADER, id.to_string())
                .header(CALLER_ROLE_HEADER, "merchant");
        }
        As::Nobody => {}
    }
    match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
    let resp = routes::build_router(Arc::clone(state))
        .oneshot(req)
        .await
        .expect("oneshot failed");
    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is not valid JSON")
    };
    (status, json)
}

async fn create(state: &Arc<AppState>, user: Uuid, amount: Value) -> (StatusCode, Value) {
    call(
        state,
        request("POST", "/v1/orders", As::User(user), Some(json!({ "fiatAmount": amount }))),
    )
    .await
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_needs_no_identity() {
    let st = make_state();
    let (status, json) = call(&st, request("GET", "/v1/health", As::Nobody, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "escrowmatch-daemon");
    assert_eq!(json["onlineMerchants"], 0);
    assert_eq!(json["acceptWindowSecs"], 30);
    assert_eq!(json["disputeWindowHours"], 24);
    assert!(json.get("online_merchants").is_none());
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_or_malformed_identity_is_401() {
    let st = make_state();
    let (status, json) = call(&st, request("GET", "/v1/orders/pending", As::Nobody, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "EM_ERR_AUTH");

    let req = Request::builder()
        .method("GET")
        .uri("/v1/orders/pending")
        .header(CALLER_ID_HEADER, "not-a-uuid")
        .header(CALLER_ROLE_HEADER, "merchant")
        .body(Body::empty())
        .unwrap();
    assert_eq!(call(&st, req).await.0, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("GET")
        .uri("/v1/orders/pending")
        .header(CALLER_ID_HEADER, Uuid::now_v7().to_string())
        .header(CALLER_ROLE_HEADER, "admin")
        .body(Body::empty())
        .unwrap();
    assert_eq!(call(&st, req).await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_role_is_403() {
    let st = make_state();
    let merchant = Uuid::now_v7();
    let (status, json) = call(
        &st,
        request("POST", "/v1/orders", As::Merchant(merchant), Some(json!({ "fiatAmount": 100 }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "EM_ERR_402");
}

// ---------------------------------------------------------------------------
// Full lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lifecycle_over_http() {
    let st = make_state();
    let user = Uuid::now_v7();
    let m1 = Uuid::now_v7();
    let m2 = Uuid::now_v7();

    // A merchant online through the registry receives the broadcast.
    let (ch, mut rx) = st.service.open_channel();
    st.service.registry().mark_online(MerchantId(m1), ch);

    let (status, json) = create(&st, user, json!(1000)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["acceptWindowSecs"], 30);
    let order_id = json["orderId"].as_str().unwrap().to_string();
    match rx.try_recv().unwrap() {
        OutboundEvent::NewOrder { crypto_amount, .. } => {
            assert_eq!(crypto_amount, Decimal::new(50, 0));
        }
        other => panic!("unexpected event {other:?}"),
    }

    let (status, json) = call(&st, request("GET", "/v1/orders/pending", As::Merchant(m2), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["orderId"], order_id.as_str());
    assert_eq!(json[0]["cryptoAmount"], "50");

    let accept = format!("/v1/orders/{order_id}/accept");
    let (status, json) = call(&st, request("POST", &accept, As::Merchant(m1), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({}));

    let (status, json) = call(&st, request("POST", &accept, As::Merchant(m2), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "EM_ERR_300");

    let proof = format!("/v1/orders/{order_id}/proof");
    let body = json!({ "proofReference": "https://bank.example/receipt/9" });
    let (status, _) = call(&st, request("POST", &proof, As::Merchant(m2), Some(body.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&st, request("POST", &proof, As::Merchant(m1), Some(body))).await;
    assert_eq!(status, StatusCode::OK);

    let verify = format!("/v1/orders/{order_id}/verify");
    let (status, json) = call(&st, request("POST", &verify, As::User(Uuid::now_v7()), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "EM_ERR_401");
    let (status, _) = call(&st, request("POST", &verify, As::User(user), None)).await;
    assert_eq!(status, StatusCode::OK);

    let get = format!("/v1/orders/{order_id}");
    let (status, json) = call(&st, request("GET", &get, As::User(user), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "completed");
    assert_eq!(json["proofReference"], "https://bank.example/receipt/9");
    assert_eq!(json["merchantId"], m1.to_string());

    let (status, _) = call(&st, request("GET", &get, As::Merchant(m2), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Validation and lookup failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_amounts_are_400() {
    let st = make_state();
    let user = Uuid::now_v7();
    for amount in [json!(0), json!(-10), json!("ten"), json!(null)] {
        let (status, json) = create(&st, user, amount).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "EM_ERR_100");
    }
    let (status, json) = create(&st, user, json!("250.75")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["orderId"].is_string());
}

#[tokio::test]
async fn malformed_body_is_400() {
    let st = make_state();
    let req = Request::builder()
        .method("POST")
        .uri("/v1/orders")
        .header(CALLER_ID_HEADER, Uuid::now_v7().to_string())
        .header(CALLER_ROLE_HEADER, "user")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = call(&st, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "EM_ERR_REQUEST");
}

#[tokio::test]
async fn unknown_and_malformed_order_ids() {
    let st = make_state();
    let merchant = As::Merchant(Uuid::now_v7());
    let unknown = format!("/v1/orders/{}/accept", Uuid::now_v7());
    let (status, json) = call(&st, request("POST", &unknown, merchant, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "EM_ERR_200");

    let (status, _) = call(&st, request("POST", "/v1/orders/xyz/accept", merchant, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_proof_is_400() {
    let st = make_state();
    let user = Uuid::now_v7();
    let merchant = Uuid::now_v7();
    let (_, json) = create(&st, user, json!(100)).await;
    let order_id = json["orderId"].as_str().unwrap().to_string();
    let accept = format!("/v1/orders/{order_id}/accept");
    call(&st, request("POST", &accept, As::Merchant(merchant), None)).await;

    let proof = format!("/v1/orders/{order_id}/proof");
    let (status, json) = call(
        &st,
        request("POST", &proof, As::Merchant(merchant), Some(json!({ "proofReference": "  " }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "EM_ERR_101");
}

#[tokio::test]
async fn requester_is_notified_of_acceptance() {
    let st = make_state();
    let user = Uuid::now_v7();
    let (ch, mut rx) = st.service.open_channel();
    st.service.registry().attach_user(UserId(user), ch);

    let (_, json) = create(&st, user, json!(100)).await;
    let order_id = json["orderId"].as_str().unwrap().to_string();
    let merchant = Uuid::now_v7();
    call(
        &st,
        request("POST", &format!("/v1/orders/{order_id}/accept"), As::Merchant(merchant), None),
    )
    .await;

    let wire = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
    assert_eq!(wire["type"], "orderAccepted");
    assert_eq!(wire["orderId"], order_id.as_str());
    assert_eq!(wire["merchantId"], merchant.to_string());
}
