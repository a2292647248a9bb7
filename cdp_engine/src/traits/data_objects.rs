use cdp_common::{Paise, CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An order creation request in the provider's terms: minor currency units and a flat notes map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderOrderRequest {
    pub amount: Paise,
    pub currency: String,
    pub receipt: String,
    pub notes: Map<String, Value>,
}

impl ProviderOrderRequest {
    pub fn new(amount: Paise, receipt: String, notes: Map<String, Value>) -> Self {
        Self { amount, currency: CURRENCY_CODE.to_string(), receipt, notes }
    }
}

/// The provider's answer to an order creation request. `raw` is kept verbatim for reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub raw: Value,
}
