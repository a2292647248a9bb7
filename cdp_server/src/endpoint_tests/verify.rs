use actix_web::{http::StatusCode, test::TestRequest};
use cdp_engine::{
    db_types::{rejection_codes, CreditOutcome},
    traits::CreditLedgerError,
};
use serde_json::{json, Value};

use super::{
    helpers::{bearer, call, checkout_signature, known_sessions, no_provider_calls, ALICE, ALICE_TOKEN, BOB_TOKEN},
    mocks::MockBackend,
};

const VERIFY: &str = "/api/payment/razorpay/verify";
const RZP_ORDER: &str = "order_RzpTest0001";
const RZP_PAYMENT: &str = "pay_RzpTest0001";

fn verification(signature: &str) -> Value {
    json!({
        "razorpay_order_id": RZP_ORDER,
        "razorpay_payment_id": RZP_PAYMENT,
        "razorpay_signature": signature,
        "packId": "p1",
        "userId": ALICE,
        "credits": 50
    })
}

fn signed_verification() -> Value {
    verification(&checkout_signature(RZP_ORDER, RZP_PAYMENT))
}

fn verify_as(token: &str, body: Value) -> TestRequest {
    TestRequest::post().uri(VERIFY).insert_header(bearer(token)).set_json(body)
}

fn ledger_never_called(db: &mut MockBackend) {
    known_sessions(db);
    db.expect_verify_payment_and_add_credits().never();
}

fn ledger_credits(db: &mut MockBackend) {
    known_sessions(db);
    db.expect_verify_payment_and_add_credits()
        .withf(|p| {
            p.user_id.as_str() == ALICE &&
                p.razorpay_order_id == RZP_ORDER &&
                p.razorpay_payment_id == RZP_PAYMENT &&
                p.credits == 50
        })
        .returning(|_| Ok(CreditOutcome::credited(10, 50, 60)));
}

fn ledger_refuses_replay(db: &mut MockBackend) {
    known_sessions(db);
    db.expect_verify_payment_and_add_credits().returning(|_| {
        Ok(CreditOutcome::rejected("Payment already processed", rejection_codes::DUPLICATE_PAYMENT))
    });
}

fn ledger_says_no_without_reason(db: &mut MockBackend) {
    known_sessions(db);
    db.expect_verify_payment_and_add_credits().returning(|_| Ok(CreditOutcome::default()));
}

fn ledger_unreachable(db: &mut MockBackend) {
    known_sessions(db);
    db.expect_verify_payment_and_add_credits()
        .returning(|_| Err(CreditLedgerError::TransportError("connection refused".into())));
}

#[actix_web::test]
async fn corrupted_signature_is_rejected_before_the_ledger() {
    let _ = env_logger::try_init().ok();
    let mut signature = checkout_signature(RZP_ORDER, RZP_PAYMENT);
    signature.replace_range(0..6, "000000");
    let req = verify_as(ALICE_TOKEN, verification(&signature));
    let (status, _, body) = call(req, ledger_never_called, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid payment signature","success":false}"#);
}

#[actix_web::test]
async fn signature_is_checked_before_the_session() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri(VERIFY).set_json(verification("not-even-hex"));
    let (status, _, body) = call(req, ledger_never_called, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid payment signature","success":false}"#);
}

#[actix_web::test]
async fn signature_over_swapped_ids_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = verify_as(ALICE_TOKEN, verification(&checkout_signature(RZP_PAYMENT, RZP_ORDER)));
    let (status, _, _) = call(req, ledger_never_called, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn session_must_belong_to_the_credited_user() {
    let _ = env_logger::try_init().ok();
    let expected = r#"{"error":"Unauthorized - User session does not match target user","success":false}"#;
    // Bob holds a validly signed payment for Alice's account
    let (status, _, body) =
        call(verify_as(BOB_TOKEN, signed_verification()), ledger_never_called, no_provider_calls()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, expected);
    // Nobody signed in
    let req = TestRequest::post().uri(VERIFY).set_json(signed_verification());
    let (status, _, body) = call(req, ledger_never_called, no_provider_calls()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, expected);
}

#[actix_web::test]
async fn verified_payment_is_credited() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) =
        call(verify_as(ALICE_TOKEN, signed_verification()), ledger_credits, no_provider_calls()).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        result,
        json!({
            "success": true,
            "message": "Payment verified and credits added successfully",
            "credits": 60,
            "creditsAdded": 50,
            "previousCredits": 10
        })
    );
}

#[actix_web::test]
async fn ledger_rejections_are_passed_through() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) =
        call(verify_as(ALICE_TOKEN, signed_verification()), ledger_refuses_replay, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"code":"DUPLICATE_PAYMENT","error":"Payment already processed","success":false}"#);

    let (status, _, body) =
        call(verify_as(ALICE_TOKEN, signed_verification()), ledger_says_no_without_reason, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"code":"UNKNOWN","error":"Payment verification failed","success":false}"#);
}

#[actix_web::test]
async fn ledger_failure() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) =
        call(verify_as(ALICE_TOKEN, signed_verification()), ledger_unreachable, no_provider_calls()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Payment verification failed","success":false}"#);
}
