use thiserror::Error;

use crate::db_types::Session;

#[derive(Debug, Clone, Error)]
pub enum AuthProviderError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Could not reach the auth provider: {0}")]
    TransportError(String),
    #[error("{0}")]
    ExchangeFailed(String),
}

impl From<sqlx::Error> for AuthProviderError {
    fn from(e: sqlx::Error) -> Self {
        AuthProviderError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait AuthProvider {
    /// Resolves an access token into a session. Unknown, expired or revoked tokens give `Ok(None)`.
    async fn session_for_token(&self, access_token: &str) -> Result<Option<Session>, AuthProviderError>;

    /// Exchanges a one-time OAuth authorization code (plus the PKCE verifier, if the flow used one) for a new session.
    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<String>,
    ) -> Result<Session, AuthProviderError>;
}
