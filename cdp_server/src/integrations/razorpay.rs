//! Adapts the Razorpay REST client to the engine's [`PaymentProvider`] contract.
use cdp_engine::traits::{PaymentProvider, ProviderError, ProviderOrder, ProviderOrderRequest};
use log::*;
use razorpay_tools::{NewRazorpayOrder, RazorpayApi, RazorpayApiError, RazorpayConfig};

#[derive(Clone)]
pub struct RazorpayProvider {
    api: RazorpayApi,
}

impl RazorpayProvider {
    pub fn new(config: RazorpayConfig) -> Result<Self, RazorpayApiError> {
        let api = RazorpayApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentProvider for RazorpayProvider {
    fn key_id(&self) -> String {
        self.api.key_id().to_string()
    }

    async fn create_order(&self, request: ProviderOrderRequest) -> Result<ProviderOrder, ProviderError> {
        let order = NewRazorpayOrder {
            amount: request.amount,
            currency: request.currency,
            receipt: request.receipt,
            notes: request.notes,
        };
        let created = self.api.create_order(&order).await.map_err(provider_error)?;
        let raw = serde_json::to_value(&created).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(ProviderOrder { id: created.id, raw })
    }
}

fn provider_error(e: RazorpayApiError) -> ProviderError {
    debug!("💳️ Razorpay call failed. {e}");
    match e {
        RazorpayApiError::QueryError { status, message } if status < 500 => {
            ProviderError::Rejected(format!("{status}. {message}"))
        },
        RazorpayApiError::InvalidAmount(s) => ProviderError::Rejected(s),
        RazorpayApiError::QueryError { status, message } => {
            ProviderError::TransportError(format!("{status}. {message}"))
        },
        RazorpayApiError::Initialization(s) | RazorpayApiError::RestResponseError(s) => {
            ProviderError::TransportError(s)
        },
        RazorpayApiError::JsonError(s) | RazorpayApiError::MissingOrderId(s) => ProviderError::InvalidResponse(s),
    }
}
