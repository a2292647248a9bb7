use thiserror::Error;

use crate::traits::{CreditLedgerError, ProviderError};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Missing required parameters")]
    MissingParameters,
    #[error("Payment provider error. {0}")]
    ProviderError(#[from] ProviderError),
}

#[derive(Debug, Clone, Error)]
pub enum CreditError {
    #[error("The session user {session_user} does not match the target user {target_user}")]
    SessionMismatch { session_user: String, target_user: String },
    #[error("Ledger error. {0}")]
    LedgerError(#[from] CreditLedgerError),
}
