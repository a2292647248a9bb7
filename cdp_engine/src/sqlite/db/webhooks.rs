//! Webhook event handling for the local backend.
//!
//! Every event is recorded. `payment.captured` events credit the payment through the ledger using the user and credit
//! quantity that checkout placed in the payment notes. Failed payments and refunds are only recorded.
use log::*;
use serde_json::{json, Value};
use sqlx::{types::Json, SqliteConnection};

use super::ledger::{self, PaymentSource};
use crate::{
    db_types::{PaymentVerification, UserId, WebhookEvent},
    sqlite::SqliteDatabaseError,
};

pub async fn record_event(event: &WebhookEvent, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let ids: Vec<i64> =
        sqlx::query_scalar("INSERT INTO webhook_events (event_type, entity_id, payload) VALUES ($1, $2, $3) RETURNING id")
            .bind(&event.event_type)
            .bind(event.entity_id())
            .bind(Json(&event.entity))
            .fetch_all(conn)
            .await?;
    ids.into_iter().next().ok_or_else(|| SqliteDatabaseError::DriverError(sqlx::Error::RowNotFound))
}

pub async fn count_events(event_type: &str, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let n = sqlx::query_scalar("SELECT COUNT(*) FROM webhook_events WHERE event_type = $1")
        .bind(event_type)
        .fetch_one(conn)
        .await?;
    Ok(n)
}

/// Records the event and acts on it. Run inside a transaction.
pub async fn handle_event(event: &WebhookEvent, conn: &mut SqliteConnection) -> Result<Value, SqliteDatabaseError> {
    let event_id = record_event(event, conn).await?;
    trace!("🗃️ Webhook event {} recorded as #{event_id}", event.event_type);
    let entity_id = event.entity_id();
    let result = match event.event_type.as_str() {
        "payment.captured" => credit_captured_payment(event, conn).await?,
        "payment.failed" => json!({
            "handled": true,
            "event": event.event_type,
            "action": "payment_failure_recorded",
            "payment_id": entity_id,
        }),
        "refund.created" | "refund.processed" => json!({
            "handled": true,
            "event": event.event_type,
            "action": "refund_recorded",
            "refund_id": entity_id,
            "payment_id": event.entity.get("payment_id"),
        }),
        other => {
            debug!("🗃️ Ignoring webhook event {other}");
            json!({ "handled": false, "event": other })
        },
    };
    Ok(result)
}

async fn credit_captured_payment(event: &WebhookEvent, conn: &mut SqliteConnection) -> Result<Value, SqliteDatabaseError> {
    let Some(payment) = payment_from_entity(&event.entity) else {
        warn!("🗃️ Captured payment {:?} does not carry the checkout notes. Not crediting.", event.entity_id());
        return Ok(json!({
            "handled": false,
            "event": event.event_type,
            "reason": "Payment notes do not identify a user and credit quantity",
        }));
    };
    let outcome = ledger::credit_payment(&payment, PaymentSource::Webhook, conn).await?;
    Ok(json!({
        "handled": true,
        "event": event.event_type,
        "action": "credit",
        "payment_id": payment.razorpay_payment_id,
        "credit": outcome,
    }))
}

/// Checkout writes `userId`, `packId` and `credits` into the order notes, and the provider copies them onto the
/// payment. Credits may arrive as a number or a numeric string.
fn payment_from_entity(entity: &Value) -> Option<PaymentVerification> {
    let payment_id = entity.get("id")?.as_str()?;
    let order_id = entity.get("order_id")?.as_str()?;
    let notes = entity.get("notes")?;
    let user_id = notes.get("userId")?.as_str()?;
    let credits = match notes.get("credits")? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    let pack_id = notes.get("packId").and_then(Value::as_str).map(String::from);
    Some(PaymentVerification {
        razorpay_order_id: order_id.to_string(),
        razorpay_payment_id: payment_id.to_string(),
        razorpay_signature: "webhook".to_string(),
        user_id: UserId::from(user_id),
        credits,
        pack_id,
    })
}
