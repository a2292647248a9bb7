use log::*;

use crate::{
    db_types::Session,
    traits::{AuthProvider, AuthProviderError},
};

/// `AuthApi` turns bearer tokens and OAuth callback codes into [`Session`]s.
#[derive(Debug)]
pub struct AuthApi<A> {
    auth: A,
}

impl<A> AuthApi<A>
where A: AuthProvider
{
    pub fn new(auth: A) -> Self {
        Self { auth }
    }

    /// Returns the session for the token, or `None` if there is no token or the auth provider does not recognise it.
    pub async fn authenticate(&self, access_token: Option<&str>) -> Result<Option<Session>, AuthProviderError> {
        match access_token.map(str::trim) {
            None | Some("") => Ok(None),
            Some(token) => {
                let session = self.auth.session_for_token(token).await?;
                match &session {
                    Some(s) => trace!("🔑️ Access token belongs to {}", s.user_id),
                    None => debug!("🔑️ Access token was not recognised"),
                }
                Ok(session)
            },
        }
    }

    pub async fn exchange_code(&self, code: &str, code_verifier: Option<String>) -> Result<Session, AuthProviderError> {
        let session = self.auth.exchange_code_for_session(code, code_verifier).await?;
        info!("🔑️ Exchanged OAuth code for a new session for {}", session.user_id);
        Ok(session)
    }
}
