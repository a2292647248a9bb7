use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use sqlx::{types::Json, FromRow, SqliteConnection};

use crate::{
    db_types::{ProfileUpdate, UserId},
    sqlite::SqliteDatabaseError,
};

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: String,
    email: Option<String>,
    credits: i64,
    plan: String,
    profile: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Flattens the profile fields into the row, the way a hosted `users` table would present them.
    fn into_json(self) -> Value {
        let mut row = self.profile.0;
        row.insert("id".into(), json!(self.id));
        row.insert("email".into(), json!(self.email));
        row.insert("credits".into(), json!(self.credits));
        row.insert("plan".into(), json!(self.plan));
        row.insert("created_at".into(), json!(self.created_at));
        row.insert("updated_at".into(), json!(self.updated_at));
        Value::Object(row)
    }
}

pub async fn create_user(
    user_id: &UserId,
    email: Option<&str>,
    credits: i64,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let now = Utc::now();
    sqlx::query("INSERT INTO users (id, email, credits, created_at, updated_at) VALUES ($1, $2, $3, $4, $4)")
        .bind(user_id)
        .bind(email)
        .bind(credits)
        .bind(now)
        .execute(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => {
                SqliteDatabaseError::UserAlreadyExists(user_id.to_string())
            },
            e => SqliteDatabaseError::from(e),
        })?;
    Ok(())
}

pub async fn fetch_credits(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Option<i64>, SqliteDatabaseError> {
    let credits = sqlx::query_scalar("SELECT credits FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(credits)
}

/// Adds credits to the user's balance and returns the new balance. Only the ledger may call this.
pub(crate) async fn add_credits(
    user_id: &UserId,
    credits: i64,
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let totals: Vec<i64> =
        sqlx::query_scalar("UPDATE users SET credits = credits + $1, updated_at = $2 WHERE id = $3 RETURNING credits")
            .bind(credits)
            .bind(Utc::now())
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    totals.into_iter().next().ok_or_else(|| SqliteDatabaseError::DriverError(sqlx::Error::RowNotFound))
}

pub async fn fetch_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Option<Value>, SqliteDatabaseError> {
    let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(UserRow::into_json))
}

/// Merges the update into the user's profile (RFC 7396 semantics, so a `null` removes a field) and returns the updated
/// row, or `None` if the user does not exist.
pub async fn update_profile(
    user_id: &UserId,
    update: ProfileUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Value>, SqliteDatabaseError> {
    let rows: Vec<UserRow> =
        sqlx::query_as("UPDATE users SET profile = json_patch(profile, $1), updated_at = $2 WHERE id = $3 RETURNING *")
            .bind(Json(update.fields()))
            .bind(Utc::now())
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().next().map(UserRow::into_json))
}
