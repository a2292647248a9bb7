use actix_web::{http::StatusCode, test::TestRequest};
use cdp_engine::{
    db_types::Plan,
    traits::{CatalogError, ProfileError},
};
use serde_json::{json, Value};

use super::{
    helpers::{bearer, call, known_sessions, no_provider_calls, ALICE, ALICE_TOKEN},
    mocks::MockBackend,
};

fn plan(id: &str, price: i64, credits: i64, is_pack: bool, display_order: i64) -> Plan {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Plan {id}"),
        "price": price,
        "billing_cycle": if price == 0 { "forever" } else { "one-time" },
        "credits": credits,
        "ai_level": "basic",
        "is_pack": is_pack,
        "display_order": display_order
    }))
    .unwrap()
}

fn catalog(db: &mut MockBackend) {
    db.expect_fetch_plans().returning(|| Ok(vec![plan("free", 0, 5, false, 0), plan("p1", 500, 50, true, 1)]));
    db.expect_fetch_credit_packs().returning(|| Ok(vec![plan("p1", 500, 50, true, 1)]));
    db.expect_fetch_free_plan().returning(|| Ok(None));
}

fn broken_catalog(db: &mut MockBackend) {
    db.expect_fetch_plans().returning(|| Err(CatalogError::QueryError("relation does not exist".into())));
}

fn profiles(db: &mut MockBackend) {
    known_sessions(db);
    db.expect_update_profile().returning(|user_id, update| {
        assert_eq!(user_id.as_str(), ALICE);
        assert!(update.fields().get("credits").is_none());
        assert!(update.fields().get("plan").is_none());
        assert!(update.fields().get("id").is_none());
        let mut row = update.fields().clone();
        row.insert("id".into(), json!(user_id));
        row.insert("credits".into(), json!(10));
        Ok(vec![Value::Object(row)])
    });
}

fn profiles_reject(db: &mut MockBackend) {
    known_sessions(db);
    db.expect_update_profile().returning(|_, _| Err(ProfileError::Rejected("Column \"nickname\" does not exist".into())));
}

#[actix_web::test]
async fn list_plans_and_packs() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) = call(TestRequest::get().uri("/api/plans"), catalog, no_provider_calls()).await;
    assert_eq!(status, StatusCode::OK);
    let plans: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(plans.as_array().unwrap().len(), 2);
    assert_eq!(plans[1]["id"], "p1");
    assert_eq!(plans[1]["billing_cycle"], "one-time");

    let (status, _, body) = call(TestRequest::get().uri("/api/plans/packs"), catalog, no_provider_calls()).await;
    assert_eq!(status, StatusCode::OK);
    let packs: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(packs[0]["credits"], 50);

    let (status, _, body) = call(TestRequest::get().uri("/api/plans/free"), catalog, no_provider_calls()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");
}

#[actix_web::test]
async fn broken_catalog_is_empty() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) = call(TestRequest::get().uri("/api/plans"), broken_catalog, no_provider_calls()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn profile_update_requires_a_session() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/user/update").set_json(json!({ "full_name": "Alice" }));
    let (status, _, body) = call(req, known_sessions, no_provider_calls()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Unauthorized"}"#);
}

#[actix_web::test]
async fn profile_update_cannot_touch_credits() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/user/update")
        .insert_header(bearer(ALICE_TOKEN))
        .set_json(json!({ "full_name": "Alice", "credits": 1_000_000, "plan": "enterprise", "id": "someone-else" }));
    let (status, _, body) = call(req, profiles, no_provider_calls()).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result, json!({ "data": [{ "full_name": "Alice", "id": ALICE, "credits": 10 }] }));
}

#[actix_web::test]
async fn profile_update_errors() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/user/update").insert_header(bearer(ALICE_TOKEN)).set_json(json!(["x"]));
    let (status, _, _) = call(req, profiles, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req =
        TestRequest::post().uri("/api/user/update").insert_header(bearer(ALICE_TOKEN)).set_json(json!({ "nickname": "al" }));
    let (status, _, body) = call(req, profiles_reject, no_provider_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Column \"nickname\" does not exist"}"#);
}
