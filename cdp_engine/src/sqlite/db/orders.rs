use chrono::Utc;
use log::trace;
use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, types::Json, FromRow, Row, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatus, ProviderOrderUpdate},
    sqlite::SqliteDatabaseError,
};

impl FromRow<'_, SqliteRow> for Order {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status.parse::<OrderStatus>().map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let notes: Json<Map<String, Value>> = row.try_get("notes")?;
        let razorpay_data: Option<Json<Value>> = row.try_get("razorpay_data")?;
        Ok(Order {
            order_id: row.try_get("order_id")?,
            user_id: row.try_get("user_id")?,
            pack_id: row.try_get("pack_id")?,
            plan_id: row.try_get("plan_id")?,
            amount: row.try_get("amount")?,
            credits: row.try_get("credits")?,
            notes: notes.0,
            status,
            razorpay_order_id: row.try_get("razorpay_order_id")?,
            razorpay_data: razorpay_data.map(|d| d.0),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Inserts a new order. This is not atomic. You can embed this call inside a transaction if you need to ensure
/// atomicity, and pass `&mut *tx` as the connection argument.
///
/// Returns `None` if an order with the same order id already exists.
///
/// `RETURNING` statements in this module are read to completion with `fetch_all`. A partially read statement is not
/// reset, and its write stays invisible to other connections until it is.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let now = Utc::now();
    let result: Result<Vec<Order>, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO payment_orders (order_id, user_id, pack_id, plan_id, amount, credits, notes, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.user_id)
    .bind(order.pack_id)
    .bind(order.plan_id)
    .bind(order.amount)
    .bind(order.credits)
    .bind(Json(order.notes))
    .bind(order.status.as_str())
    .bind(now)
    .fetch_all(conn)
    .await;
    match result {
        Ok(rows) => Ok(rows.into_iter().next()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Records the provider's order id and response against the local order. Returns `None` if the order does not exist.
pub async fn attach_provider_order(
    order_id: &OrderId,
    update: ProviderOrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let rows: Vec<Order> = sqlx::query_as(
        r#"
            UPDATE payment_orders
            SET razorpay_order_id = $1, razorpay_data = $2, status = $3, updated_at = $4
            WHERE order_id = $5
            RETURNING *;
        "#,
    )
    .bind(update.razorpay_order_id)
    .bind(Json(update.razorpay_data))
    .bind(OrderStatus::ProviderIdAssigned.as_str())
    .bind(Utc::now())
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ Provider order attached to {order_id}");
    Ok(rows.into_iter().next())
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let order = sqlx::query_as("SELECT * FROM payment_orders WHERE order_id = $1 LIMIT 1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Fetches the most recent local order carrying the given provider order id.
pub async fn fetch_order_by_razorpay_order_id(
    razorpay_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let order = sqlx::query_as("SELECT * FROM payment_orders WHERE razorpay_order_id = $1 ORDER BY id DESC LIMIT 1")
        .bind(razorpay_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn mark_paid(razorpay_order_id: &str, conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE payment_orders SET status = $1, updated_at = $2 WHERE razorpay_order_id = $3")
        .bind(OrderStatus::Paid.as_str())
        .bind(Utc::now())
        .bind(razorpay_order_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
