use std::sync::Arc;

use thiserror::Error;

use super::data_objects::{ProviderOrder, ProviderOrderRequest};

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("The payment provider rejected the request: {0}")]
    Rejected(String),
    #[error("Could not reach the payment provider: {0}")]
    TransportError(String),
    #[error("The payment provider returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// An external payment processor that can open orders for a checkout.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// The public key id that the browser checkout widget needs.
    fn key_id(&self) -> String;

    async fn create_order(&self, request: ProviderOrderRequest) -> Result<ProviderOrder, ProviderError>;
}

impl<P: PaymentProvider> PaymentProvider for Arc<P> {
    fn key_id(&self) -> String {
        self.as_ref().key_id()
    }

    async fn create_order(&self, request: ProviderOrderRequest) -> Result<ProviderOrder, ProviderError> {
        self.as_ref().create_order(request).await
    }
}
