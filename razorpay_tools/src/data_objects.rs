use cdp_common::Paise;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The request body for `POST /orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRazorpayOrder {
    /// Always in the minor currency unit
    pub amount: Paise,
    pub currency: String,
    pub receipt: String,
    #[serde(default)]
    pub notes: Map<String, Value>,
}

/// An order as returned by Razorpay.
///
/// Razorpay sends `notes` as `[]` when there are none, so it is kept as a raw JSON value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RazorpayOrder {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub amount: Paise,
    #[serde(default)]
    pub amount_paid: Paise,
    #[serde(default)]
    pub amount_due: Paise,
    #[serde(default)]
    pub currency: String,
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub attempts: i64,
    #[serde(default)]
    pub notes: Value,
    #[serde(default)]
    pub created_at: i64,
}

//--------------------------------------        Webhooks        --------------------------------------------------------

/// The outer structure of every Razorpay webhook call.
///
/// ```json
/// { "entity": "event", "event": "payment.captured", "contains": ["payment"],
///   "payload": { "payment": { "entity": { ... } } }, "created_at": 1700000000 }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub event: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default)]
    pub payload: WebhookPayload,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub payment: Option<WebhookEntity>,
    pub refund: Option<WebhookEntity>,
    pub order: Option<WebhookEntity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEntity {
    pub entity: Option<Value>,
}

impl WebhookEnvelope {
    /// The sub-object that the event is about. Payment events win over refund events, and order-only events have
    /// no entity as far as the credit flow is concerned.
    pub fn entity(&self) -> Option<&Value> {
        let payment = self.payload.payment.as_ref().and_then(|p| p.entity.as_ref());
        let refund = self.payload.refund.as_ref().and_then(|r| r.entity.as_ref());
        payment.or(refund).filter(|v| !v.is_null())
    }
}
