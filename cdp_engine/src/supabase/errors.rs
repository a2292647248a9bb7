use serde_json::Value;
use thiserror::Error;

use crate::traits::{AuthProviderError, CatalogError, CreditLedgerError, OrderStoreError, ProfileError};

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl SupabaseError {
    /// Builds a query error from a failed response body, keeping only the human-readable message. PostgREST uses
    /// `message`, GoTrue uses `msg` or `error_description`.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                ["message", "msg", "error_description", "error"]
                    .iter()
                    .find_map(|k| v.get(*k).and_then(Value::as_str).map(String::from))
            })
            .unwrap_or_else(|| body.to_string());
        SupabaseError::QueryError { status, message }
    }

    /// The message to show a caller. Transport details are not included.
    pub fn user_message(&self) -> String {
        match self {
            SupabaseError::QueryError { message, .. } => message.clone(),
            _ => "The database could not be reached".to_string(),
        }
    }
}

impl From<SupabaseError> for OrderStoreError {
    fn from(e: SupabaseError) -> Self {
        match e {
            SupabaseError::QueryError { message, .. } => OrderStoreError::Rejected(message),
            e => OrderStoreError::DatabaseError(e.to_string()),
        }
    }
}

impl From<SupabaseError> for CreditLedgerError {
    fn from(e: SupabaseError) -> Self {
        match e {
            SupabaseError::JsonError(s) => CreditLedgerError::InvalidResponse(s),
            e => CreditLedgerError::TransportError(e.to_string()),
        }
    }
}

impl From<SupabaseError> for CatalogError {
    fn from(e: SupabaseError) -> Self {
        CatalogError::QueryError(e.to_string())
    }
}

impl From<SupabaseError> for ProfileError {
    fn from(e: SupabaseError) -> Self {
        ProfileError::Rejected(e.user_message())
    }
}

impl From<SupabaseError> for AuthProviderError {
    fn from(e: SupabaseError) -> Self {
        match e {
            SupabaseError::QueryError { message, .. } => AuthProviderError::ExchangeFailed(message),
            e => AuthProviderError::TransportError(e.to_string()),
        }
    }
}
