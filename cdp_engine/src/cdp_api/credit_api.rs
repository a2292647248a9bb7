use std::fmt::Debug;

use log::*;
use serde_json::Value;

use crate::{
    cdp_api::errors::CreditError,
    db_types::{CreditOutcome, PaymentVerification, Session, WebhookEvent},
    traits::{CreditLedger, CreditLedgerError},
};

/// `CreditApi` is the only way the server changes a user's credit balance.
///
/// Callers must have verified the payment provider's signature before handing a [`PaymentVerification`] or
/// [`WebhookEvent`] to this API.
pub struct CreditApi<B> {
    db: B,
}

impl<B> Debug for CreditApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CreditApi")
    }
}

impl<B> CreditApi<B>
where B: CreditLedger
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Credits a signature-verified payment to the signed-in user. The session user must be the user named in the
    /// payment, otherwise nothing is sent to the ledger.
    pub async fn verify_payment(
        &self,
        session: &Session,
        payment: PaymentVerification,
    ) -> Result<CreditOutcome, CreditError> {
        if session.user_id != payment.user_id {
            warn!(
                "💰️ Session user {} tried to claim payment {} for user {}",
                session.user_id, payment.razorpay_payment_id, payment.user_id
            );
            return Err(CreditError::SessionMismatch {
                session_user: session.user_id.to_string(),
                target_user: payment.user_id.to_string(),
            });
        }
        let outcome = self.db.verify_payment_and_add_credits(&payment).await?;
        if outcome.success {
            info!(
                "💰️ Payment {} credited {} credits to {}. New balance: {}",
                payment.razorpay_payment_id,
                outcome.credits_added.unwrap_or(payment.credits),
                payment.user_id,
                outcome.new_total.map(|t| t.to_string()).unwrap_or_else(|| "unknown".into())
            );
        } else {
            warn!(
                "💰️ Payment {} was not credited. {} ({})",
                payment.razorpay_payment_id,
                outcome.error.as_deref().unwrap_or("no reason given"),
                outcome.code.as_deref().unwrap_or("UNKNOWN")
            );
        }
        Ok(outcome)
    }

    pub async fn process_webhook(&self, event: WebhookEvent) -> Result<Value, CreditLedgerError> {
        debug!("💰️ Forwarding {} webhook for {}", event.event_type, event.entity_id().unwrap_or("<no id>"));
        let result = self.db.handle_webhook_event(&event).await?;
        trace!("💰️ Webhook result: {result}");
        Ok(result)
    }
}
