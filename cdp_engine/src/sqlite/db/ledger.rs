//! The credit ledger.
//!
//! Every credit increment goes through [`credit_payment`], which claims the provider payment id first (the primary key
//! of `payments`) and only then validates the payment against the stored order. The claim is the first write in the
//! transaction, so two concurrent attempts on the same payment id serialise on the SQLite write lock and the second
//! one finds the id taken.
//!
//! Run [`credit_payment`] inside a transaction.
use log::*;
use sqlx::SqliteConnection;

use super::{orders, users};
use crate::{
    db_types::{rejection_codes::*, CreditOutcome, OrderStatus, PaymentVerification},
    sqlite::SqliteDatabaseError,
};

/// Where a credit request came from. Stored on the payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentSource {
    Verify,
    Webhook,
}

impl PaymentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentSource::Verify => "verify",
            PaymentSource::Webhook => "webhook",
        }
    }
}

/// Credits the payment to the user, at most once per provider payment id.
///
/// Business rejections come back as `Ok` with a `success = false` outcome and leave no trace in the ledger.
pub async fn credit_payment(
    payment: &PaymentVerification,
    source: PaymentSource,
    conn: &mut SqliteConnection,
) -> Result<CreditOutcome, SqliteDatabaseError> {
    if payment.credits <= 0 {
        return Ok(CreditOutcome::rejected("Credit quantity must be positive", INVALID_CREDITS));
    }
    if !claim_payment_id(payment, source, conn).await? {
        info!("🗃️ Payment {} has already been processed. Not crediting again.", payment.razorpay_payment_id);
        return Ok(CreditOutcome::rejected("Payment has already been processed", DUPLICATE_PAYMENT));
    }
    if let Some(rejection) = check_against_order(payment, conn).await? {
        release_payment_id(&payment.razorpay_payment_id, conn).await?;
        return Ok(rejection);
    }
    let Some(previous) = users::fetch_credits(&payment.user_id, conn).await? else {
        release_payment_id(&payment.razorpay_payment_id, conn).await?;
        return Ok(CreditOutcome::rejected("User not found", USER_NOT_FOUND));
    };
    let new_total = users::add_credits(&payment.user_id, payment.credits, conn).await?;
    let n = orders::mark_paid(&payment.razorpay_order_id, conn).await?;
    debug!(
        "🗃️ Payment {} credited {} to {} ({previous} -> {new_total}). {n} order(s) marked paid.",
        payment.razorpay_payment_id, payment.credits, payment.user_id
    );
    Ok(CreditOutcome::credited(previous, payment.credits, new_total))
}

/// Returns `false` if the payment id has been claimed before.
async fn claim_payment_id(
    payment: &PaymentVerification,
    source: PaymentSource,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            INSERT INTO payments (payment_id, razorpay_order_id, user_id, credits, signature, source)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (payment_id) DO NOTHING;
        "#,
    )
    .bind(&payment.razorpay_payment_id)
    .bind(&payment.razorpay_order_id)
    .bind(&payment.user_id)
    .bind(payment.credits)
    .bind(&payment.razorpay_signature)
    .bind(source.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

async fn release_payment_id(payment_id: &str, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("DELETE FROM payments WHERE payment_id = $1").bind(payment_id).execute(conn).await?;
    Ok(())
}

async fn check_against_order(
    payment: &PaymentVerification,
    conn: &mut SqliteConnection,
) -> Result<Option<CreditOutcome>, SqliteDatabaseError> {
    let Some(order) = orders::fetch_order_by_razorpay_order_id(&payment.razorpay_order_id, conn).await? else {
        warn!("🗃️ Payment {} refers to unknown order {}", payment.razorpay_payment_id, payment.razorpay_order_id);
        return Ok(Some(CreditOutcome::rejected("Order not found", ORDER_NOT_FOUND)));
    };
    if order.user_id != payment.user_id {
        warn!(
            "🗃️ Payment {} names user {}, but order {} belongs to {}",
            payment.razorpay_payment_id, payment.user_id, order.order_id, order.user_id
        );
        return Ok(Some(CreditOutcome::rejected("Order does not belong to this user", USER_MISMATCH)));
    }
    if order.credits != payment.credits {
        warn!(
            "🗃️ Payment {} claims {} credits, but order {} was for {}",
            payment.razorpay_payment_id, payment.credits, order.order_id, order.credits
        );
        return Ok(Some(CreditOutcome::rejected("Credit quantity does not match the order", CREDITS_MISMATCH)));
    }
    if order.status == OrderStatus::Paid {
        warn!("🗃️ Order {} has already been paid", order.order_id);
        return Ok(Some(CreditOutcome::rejected("Order has already been paid", ORDER_ALREADY_PAID)));
    }
    Ok(None)
}
