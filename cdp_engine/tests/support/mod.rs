#![allow(dead_code)]
use cdp_common::Rupees;
use cdp_engine::{
    db_types::{NewOrder, Order, OrderId, PaymentVerification, ProviderOrderUpdate, UserId},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::OrderManagement,
    SqliteDatabase,
};
use serde_json::json;

pub const ALICE: &str = "5f0c3b8e-7a0e-4c0a-9d7e-1b2c3d4e5f60";
pub const BOB: &str = "9a1d7c44-2b3e-4f50-8a6b-0c1d2e3f4a5b";

pub async fn new_db() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

pub async fn new_db_with_users() -> SqliteDatabase {
    let db = new_db().await;
    db.create_user(&UserId::from(ALICE), Some("alice@coderduo.in"), 10).await.expect("Error creating Alice");
    db.create_user(&UserId::from(BOB), Some("bob@coderduo.in"), 0).await.expect("Error creating Bob");
    db
}

/// Creates a local order that the payment provider has accepted, as checkout would leave it.
pub async fn provider_order(db: &SqliteDatabase, user: &str, razorpay_order_id: &str, credits: i64) -> Order {
    let order_id = OrderId(format!("order_{}_1", rand::random::<u32>()));
    let order = NewOrder::new(order_id.clone(), UserId::from(user), "p1".into(), Rupees::from(500), credits);
    db.insert_order(order).await.expect("Error inserting order");
    let update = ProviderOrderUpdate::new(razorpay_order_id, json!({"id": razorpay_order_id, "status": "created"}));
    db.attach_provider_order(&order_id, update).await.expect("Error attaching provider order")
}

pub fn verification(user: &str, razorpay_order_id: &str, payment_id: &str, credits: i64) -> PaymentVerification {
    PaymentVerification {
        razorpay_order_id: razorpay_order_id.to_string(),
        razorpay_payment_id: payment_id.to_string(),
        razorpay_signature: "9ef4dffbfd84f1318f6739a3ce19f9d85851857ae648f114332d8401e0949a3d".to_string(),
        user_id: UserId::from(user),
        credits,
        pack_id: Some("p1".to_string()),
    }
}
