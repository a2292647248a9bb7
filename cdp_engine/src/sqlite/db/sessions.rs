//! Local sessions and one-time OAuth codes.
//!
//! Tokens are opaque random strings. The hosted auth provider issues JWTs instead, but the gateway never looks inside
//! a token, so the difference is invisible to the rest of the engine.
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{Session, UserId},
    sqlite::SqliteDatabaseError,
};

/// How long a local access token stays valid, in seconds.
pub const SESSION_LIFETIME: i64 = 3600;
/// How long an OAuth code can wait before it is exchanged, in seconds.
pub const AUTH_CODE_LIFETIME: i64 = 600;

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(FromRow)]
struct SessionRow {
    user_id: UserId,
    email: Option<String>,
    refresh_token: String,
    expires_at: i64,
}

pub async fn issue_session(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Session, SqliteDatabaseError> {
    let access_token = random_token();
    let refresh_token = random_token();
    let expires_at = (Utc::now() + Duration::seconds(SESSION_LIFETIME)).timestamp();
    sqlx::query("INSERT INTO sessions (access_token, refresh_token, user_id, expires_at) VALUES ($1, $2, $3, $4)")
        .bind(&access_token)
        .bind(&refresh_token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&mut *conn)
        .await?;
    let email: Option<String> = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    let mut session = Session::new(user_id.clone(), access_token).with_email(email);
    session.refresh_token = Some(cdp_common::Secret::new(refresh_token));
    session.expires_in = Some(SESSION_LIFETIME);
    Ok(session)
}

/// Returns the session for an unexpired access token.
pub async fn fetch_session(
    access_token: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Session>, SqliteDatabaseError> {
    let now = Utc::now().timestamp();
    let row: Option<SessionRow> = sqlx::query_as(
        r#"
            SELECT sessions.user_id, users.email, sessions.refresh_token, sessions.expires_at
            FROM sessions JOIN users ON users.id = sessions.user_id
            WHERE sessions.access_token = $1 AND sessions.expires_at > $2;
        "#,
    )
    .bind(access_token)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|r| {
        let mut session = Session::new(r.user_id, access_token.to_string()).with_email(r.email);
        session.refresh_token = Some(cdp_common::Secret::new(r.refresh_token));
        session.expires_in = Some(r.expires_at - now);
        session
    }))
}

pub async fn revoke_session(access_token: &str, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM sessions WHERE access_token = $1").bind(access_token).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn issue_auth_code(
    user_id: &UserId,
    code_verifier: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<String, SqliteDatabaseError> {
    let code = random_token();
    sqlx::query("INSERT INTO auth_codes (code, user_id, code_verifier, issued_at) VALUES ($1, $2, $3, $4)")
        .bind(&code)
        .bind(user_id)
        .bind(code_verifier)
        .bind(Utc::now().timestamp())
        .execute(conn)
        .await?;
    Ok(code)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeRedemption {
    Redeemed(UserId),
    /// Unknown, already used or expired
    InvalidCode,
    VerifierMismatch,
}

/// Burns the code and returns the user it was issued to. A code can only be redeemed once, even if the verifier
/// turns out to be wrong.
pub async fn redeem_auth_code(
    code: &str,
    code_verifier: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<CodeRedemption, SqliteDatabaseError> {
    let oldest = (Utc::now() - Duration::seconds(AUTH_CODE_LIFETIME)).timestamp();
    let rows: Vec<(UserId, Option<String>)> = sqlx::query_as(
        r#"
            UPDATE auth_codes SET used = TRUE
            WHERE code = $1 AND used = FALSE AND issued_at >= $2
            RETURNING user_id, code_verifier;
        "#,
    )
    .bind(code)
    .bind(oldest)
    .fetch_all(conn)
    .await?;
    let result = match rows.into_iter().next() {
        None => CodeRedemption::InvalidCode,
        Some((_, Some(expected))) if code_verifier != Some(expected.as_str()) => CodeRedemption::VerifierMismatch,
        Some((user_id, _)) => CodeRedemption::Redeemed(user_id),
    };
    Ok(result)
}
