use serde_json::Value;
use thiserror::Error;

use crate::db_types::{CreditOutcome, PaymentVerification, WebhookEvent};

#[derive(Debug, Clone, Error)]
pub enum CreditLedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Could not reach the ledger: {0}")]
    TransportError(String),
    #[error("The ledger returned an unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<sqlx::Error> for CreditLedgerError {
    fn from(e: sqlx::Error) -> Self {
        CreditLedgerError::DatabaseError(e.to_string())
    }
}

/// The credit ledger owns every change to a user's credit balance.
///
/// Implementations must guarantee that a provider payment id is credited at most once, no matter how many times (or
/// how concurrently) it is presented. A replay is reported as a `success = false` [`CreditOutcome`], not as an error.
#[allow(async_fn_in_trait)]
pub trait CreditLedger {
    /// Atomically records the payment and adds `payment.credits` to the user's balance.
    async fn verify_payment_and_add_credits(
        &self,
        payment: &PaymentVerification,
    ) -> Result<CreditOutcome, CreditLedgerError>;

    /// Processes a signature-verified webhook event and returns the backend's description of what it did.
    async fn handle_webhook_event(&self, event: &WebhookEvent) -> Result<Value, CreditLedgerError>;
}
