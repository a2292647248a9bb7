use cdp_common::Rupees;
use cdp_engine::{
    db_types::{CreditOutcome, PaymentVerification, UserId},
    CreateOrderRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The storefront's order request. Everything is optional here so that a missing field is reported as a missing
/// parameter rather than as a malformed body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderParams {
    #[serde(default)]
    pub pack_id: Option<String>,
    /// Rupees, with up to two decimal places
    #[serde(default)]
    pub amount: Option<Rupees>,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub credits: Option<i64>,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub notes: Option<Map<String, Value>>,
}

impl From<CreateOrderParams> for CreateOrderRequest {
    fn from(params: CreateOrderParams) -> Self {
        let amount = params.amount.unwrap_or_default();
        CreateOrderRequest::new(params.pack_id.unwrap_or_default(), amount, params.credits.unwrap_or_default())
            .with_plan_id(params.plan_id)
            .with_receipt(params.receipt.filter(|r| !r.trim().is_empty()))
            .with_notes(params.notes)
    }
}

/// What Razorpay's checkout widget hands back to the browser, plus the storefront's own fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyPaymentParams {
    #[serde(default)]
    pub razorpay_order_id: String,
    #[serde(default)]
    pub razorpay_payment_id: String,
    #[serde(default)]
    pub razorpay_signature: String,
    #[serde(default, rename = "packId")]
    pub pack_id: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub credits: i64,
}

impl From<VerifyPaymentParams> for PaymentVerification {
    fn from(params: VerifyPaymentParams) -> Self {
        PaymentVerification {
            razorpay_order_id: params.razorpay_order_id,
            razorpay_payment_id: params.razorpay_payment_id,
            razorpay_signature: params.razorpay_signature,
            user_id: UserId::from(params.user_id),
            credits: params.credits,
            pack_id: params.pack_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub success: bool,
    pub message: String,
    /// The new balance
    pub credits: Option<i64>,
    pub credits_added: Option<i64>,
    pub previous_credits: Option<i64>,
}

impl From<CreditOutcome> for VerificationResponse {
    fn from(outcome: CreditOutcome) -> Self {
        Self {
            success: true,
            message: "Payment verified and credits added successfully".to_string(),
            credits: outcome.new_total,
            credits_added: outcome.credits_added,
            previous_credits: outcome.previous_credits,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub processed: bool,
    pub result: Value,
}

impl WebhookAck {
    pub fn processed(result: Value) -> Self {
        Self { received: true, processed: true, result }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthCallbackParams {
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}
