use cdp_common::{Paise, Rupees};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::db_types::{OrderId, UserId};

/// A buyer's request to purchase a credit pack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateOrderRequest {
    pub pack_id: String,
    /// Price in whole rupees
    pub amount: Rupees,
    pub plan_id: Option<String>,
    pub credits: i64,
    /// Defaults to the generated local order id
    pub receipt: Option<String>,
    pub notes: Option<Map<String, Value>>,
}

impl CreateOrderRequest {
    pub fn new<S: Into<String>>(pack_id: S, amount: Rupees, credits: i64) -> Self {
        Self { pack_id: pack_id.into(), amount, credits, ..Default::default() }
    }

    pub fn with_plan_id(mut self, plan_id: Option<String>) -> Self {
        self.plan_id = plan_id;
        self
    }

    pub fn with_receipt(mut self, receipt: Option<String>) -> Self {
        self.receipt = receipt;
        self
    }

    pub fn with_notes(mut self, notes: Option<Map<String, Value>>) -> Self {
        self.notes = notes;
        self
    }

    /// A pack id, a positive price and a positive credit quantity are all required.
    pub fn is_complete(&self) -> bool {
        !self.pack_id.trim().is_empty() && self.amount.is_positive() && self.credits > 0
    }
}

/// Everything the browser needs to open the payment provider's checkout widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub order_id: OrderId,
    pub razorpay_order_id: String,
    /// In paise
    pub amount: Paise,
    pub currency: String,
    pub key_id: String,
    pub pack_id: String,
    pub credits: i64,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Map<String, Value>>,
}
