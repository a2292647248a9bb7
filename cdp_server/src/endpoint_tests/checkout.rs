use actix_web::{http::StatusCode, test::TestRequest};
use cdp_common::Paise;
use chrono::Utc;
use cdp_engine::{
    db_types::{NewOrder, Order, OrderStatus},
    traits::{OrderStoreError, ProviderError, ProviderOrder},
};
use regex::Regex;
use serde_json::{json, Value};

use super::{
    helpers::{bearer, call, known_sessions, no_provider_calls, ALICE, ALICE_TOKEN, KEY_ID},
    mocks::{MockBackend, MockProvider},
};

const CREATE: &str = "/api/payment/razorpay/create";

fn stored(order: NewOrder) -> Order {
    Order {
        order_id: order.order_id,
        user_id: order.user_id,
        pack_id: order.pack_id,
        plan_id: order.plan_id,
        amount: order.amount,
        credits: order.credits,
        notes: order.notes,
        status: order.status,
        razorpay_order_id: None,
        razorpay_data: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn order_store(db: &mut MockBackend) {
    known_sessions(db);
    db.expect_insert_order().returning(|order| {
        assert_eq!(order.status, OrderStatus::Created);
        Ok(stored(order))
    });
    db.expect_attach_provider_order().returning(|order_id, update| {
        assert_eq!(update.razorpay_order_id, "order_RzpTest0001");
        Err(OrderStoreError::OrderNotFound(order_id.clone()))
    });
}

fn broken_order_store(db: &mut MockBackend) {
    known_sessions(db);
    db.expect_insert_order().returning(|_| Err(OrderStoreError::DatabaseError("no such table".into())));
    db.expect_attach_provider_order().returning(|_, _| Err(OrderStoreError::DatabaseError("no such table".into())));
}

fn razorpay_accepts() -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_key_id().returning(|| KEY_ID.to_string());
    provider
        .expect_create_order()
        .withf(|req| {
            req.amount == Paise::from(50_000) &&
                req.currency == "INR" &&
                req.notes["userId"] == ALICE &&
                req.notes["packId"] == "p1" &&
                req.notes["credits"] == 50
        })
        .times(1)
        .returning(|req| {
            let raw = json!({ "id": "order_RzpTest0001", "amount": req.amount, "receipt": req.receipt });
            Ok(ProviderOrder { id: "order_RzpTest0001".into(), raw })
        });
    provider
}

fn order_request(body: Value) -> TestRequest {
    TestRequest::post().uri(CREATE).insert_header(bearer(ALICE_TOKEN)).set_json(body)
}

#[actix_web::test]
async fn create_order_requires_a_session() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri(CREATE).set_json(json!({ "packId": "p1", "amount": 500, "credits": 50 }));
    let (status, _, body) = call(req, known_sessions, no_provider_calls()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Unauthorized - Please sign in"}"#);

    let req = TestRequest::post()
        .uri(CREATE)
        .insert_header(bearer("expired-token"))
        .set_json(json!({ "packId": "p1", "amount": 500, "credits": 50 }));
    let (status, _, _) = call(req, known_sessions, no_provider_calls()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_order_with_missing_parameters() {
    let _ = env_logger::try_init().ok();
    for body in [
        json!({ "amount": 500, "credits": 50 }),
        json!({ "packId": "p1", "credits": 50 }),
        json!({ "packId": "p1", "amount": 500 }),
        json!({ "packId": "p1", "amount": 0, "credits": 50 }),
        json!({ "packId": "", "amount": 500, "credits": 50 }),
    ] {
        let (status, _, body) = call(order_request(body), known_sessions, no_provider_calls()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"Missing required parameters"}"#);
    }
}

#[actix_web::test]
async fn create_order_for_a_credit_pack() {
    let _ = env_logger::try_init().ok();
    let req = order_request(json!({ "packId": "p1", "amount": 500, "credits": 50, "notes": { "campaign": "diwali" } }));
    let (status, _, body) = call(req, order_store, razorpay_accepts()).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    let order_id = result["orderId"].as_str().unwrap();
    assert!(Regex::new(r"^order_\d+_\d{1,3}$").unwrap().is_match(order_id), "bad order id: {order_id}");
    assert_eq!(result["razorpayOrderId"], "order_RzpTest0001");
    assert_eq!(result["amount"], 50_000);
    assert_eq!(result["currency"], "INR");
    assert_eq!(result["keyId"], KEY_ID);
    assert_eq!(result["packId"], "p1");
    assert_eq!(result["credits"], 50);
    assert_eq!(result["userId"], ALICE);
    assert_eq!(result["notes"], json!({ "campaign": "diwali" }));
}

#[actix_web::test]
async fn checkout_goes_ahead_when_the_order_cannot_be_stored() {
    let _ = env_logger::try_init().ok();
    let req = order_request(json!({ "packId": "p1", "amount": 500, "credits": 50 }));
    let (status, _, body) = call(req, broken_order_store, razorpay_accepts()).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["razorpayOrderId"], "order_RzpTest0001");
    assert!(result.get("notes").is_none());
}

#[actix_web::test]
async fn provider_failure() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_key_id().returning(|| KEY_ID.to_string());
    provider
        .expect_create_order()
        .returning(|_| Err(ProviderError::Rejected("400. The api key provided is invalid".into())));
    let req = order_request(json!({ "packId": "p1", "amount": 500, "credits": 50 }));
    let (status, _, body) = call(req, order_store, provider).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Failed to create Razorpay order"}"#);
}

#[actix_web::test]
async fn malformed_order_body() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri(CREATE).insert_header(bearer(ALICE_TOKEN)).set_payload("{packId: p1");
    let (status, _, body) = call(req, known_sessions, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Payload deserialization error"}"#);
}

#[actix_web::test]
async fn create_order_for_a_fractional_amount() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_key_id().returning(|| KEY_ID.to_string());
    provider.expect_create_order().withf(|req| req.amount == Paise::from(9950)).times(1).returning(|req| {
        let raw = json!({ "id": "order_RzpTest0001", "amount": req.amount });
        Ok(ProviderOrder { id: "order_RzpTest0001".into(), raw })
    });
    let req = order_request(json!({ "packId": "p1", "amount": 99.5, "credits": 50 }));
    let (status, _, body) = call(req, order_store, provider).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["amount"], 9950);

    let req = order_request(json!({ "packId": "p1", "amount": 99.995, "credits": 50 }));
    let (status, _, body) = call(req, known_sessions, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Payload deserialization error"}"#);
}
