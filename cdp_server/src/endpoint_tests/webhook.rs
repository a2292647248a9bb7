use std::sync::atomic::{AtomicUsize, Ordering};

use actix_web::{http::StatusCode, test::TestRequest};
use cdp_engine::traits::CreditLedgerError;
use serde_json::{json, Value};

use super::{
    helpers::{call, no_provider_calls, webhook_signature},
    mocks::MockBackend,
};

const WEBHOOK: &str = "/api/payment/razorpay/webhook";

const PAYMENT_CAPTURED: &str = r#"{"entity":"event","event":"payment.captured","contains":["payment"],"payload":{"payment":{"entity":{"id":"pay_RzpTest0001","entity":"payment","amount":50000,"currency":"INR","status":"captured","order_id":"order_RzpTest0001","notes":{"userId":"5f0c3b8e-7a0e-4c0a-9d7e-1b2c3d4e5f60","packId":"p1","credits":50}}}},"created_at":1717000000}"#;

const REFUND_PROCESSED: &str = r#"{"event":"refund.processed","payload":{"refund":{"entity":{"id":"rfnd_RzpTest0001","entity":"refund","payment_id":"pay_RzpTest0001","amount":50000}}}}"#;

static FORWARDED: AtomicUsize = AtomicUsize::new(0);

fn nothing_forwarded(db: &mut MockBackend) {
    db.expect_handle_webhook_event().never();
}

fn ledger_accepts(db: &mut MockBackend) {
    db.expect_handle_webhook_event().returning(|event| {
        let id = event.entity_id().unwrap_or_default().to_string();
        Ok(json!({ "handled": true, "event": event.event_type, "id": id }))
    });
}

fn ledger_counts(db: &mut MockBackend) {
    db.expect_handle_webhook_event().returning(|_| {
        FORWARDED.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "handled": true }))
    });
}

fn ledger_fails(db: &mut MockBackend) {
    db.expect_handle_webhook_event().returning(|_| Err(CreditLedgerError::DatabaseError("deadlock".into())));
}

fn signed(body: &str) -> TestRequest {
    TestRequest::post()
        .uri(WEBHOOK)
        .insert_header(("Content-Type", "application/json"))
        .insert_header(("X-Razorpay-Signature", webhook_signature(body)))
        .set_payload(body.to_string())
}

#[actix_web::test]
async fn missing_signature() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri(WEBHOOK).set_payload(PAYMENT_CAPTURED);
    let (status, _, body) = call(req, nothing_forwarded, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Missing Razorpay signature"}"#);
}

#[actix_web::test]
async fn invalid_signature_is_not_forwarded() {
    let _ = env_logger::try_init().ok();
    // Signed over a different body
    let req = TestRequest::post()
        .uri(WEBHOOK)
        .insert_header(("X-Razorpay-Signature", webhook_signature(REFUND_PROCESSED)))
        .set_payload(PAYMENT_CAPTURED);
    let (status, _, body) = call(req, nothing_forwarded, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid signature"}"#);
}

#[actix_web::test]
async fn signed_payment_webhook_is_forwarded_once() {
    let _ = env_logger::try_init().ok();
    let (status, _, _) = call(signed(PAYMENT_CAPTURED), ledger_counts, no_provider_calls()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(FORWARDED.load(Ordering::SeqCst), 1);
    let (status, _, body) = call(signed(PAYMENT_CAPTURED), ledger_accepts, no_provider_calls()).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["received"], true);
    assert_eq!(result["processed"], true);
    assert_eq!(result["result"], json!({ "handled": true, "event": "payment.captured", "id": "pay_RzpTest0001" }));
}

#[actix_web::test]
async fn refund_webhook_falls_back_to_the_refund_entity() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) = call(signed(REFUND_PROCESSED), ledger_accepts, no_provider_calls()).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["result"]["id"], "rfnd_RzpTest0001");
}

#[actix_web::test]
async fn webhook_without_an_entity() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"event":"order.paid","payload":{"order":{"entity":{"id":"order_RzpTest0001"}}}}"#;
    let (status, _, body) = call(signed(body), nothing_forwarded, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid webhook payload structure"}"#);
}

#[actix_web::test]
async fn signed_garbage() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) = call(signed("this is not json"), nothing_forwarded, no_provider_calls()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Webhook processing failed"}"#);
}

#[actix_web::test]
async fn ledger_error_while_processing() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) = call(signed(PAYMENT_CAPTURED), ledger_fails, no_provider_calls()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Error processing webhook"}"#);
}
