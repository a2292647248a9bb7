use std::{fmt::Display, str::FromStr};

use cdp_common::{Rupees, Secret};
use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------        UserId         ---------------------------------------------------------
/// The auth provider's identifier for a user. For Supabase this is the `auth.users` UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     OrderStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// The order row exists locally, but the payment provider has not assigned an id yet.
    Created,
    /// The payment provider has accepted the order and assigned its own order id.
    ProviderIdAssigned,
    /// A verified payment has been credited against this order.
    Paid,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::ProviderIdAssigned => "provider_id_assigned",
            OrderStatus::Paid => "paid",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatus {
    type Err = ConversionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "provider_id_assigned" => Ok(Self::ProviderIdAssigned),
            "paid" => Ok(Self::Paid),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Created");
            OrderStatus::Created
        })
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    /// The locally generated order id, `order_<unix-millis>_<n>`
    pub order_id: OrderId,
    pub user_id: UserId,
    /// The credit pack being purchased
    pub pack_id: String,
    pub plan_id: Option<String>,
    /// The price of the pack in whole rupees
    pub amount: Rupees,
    /// The number of credits the buyer receives once the payment is verified
    pub credits: i64,
    pub notes: Map<String, Value>,
    pub status: OrderStatus,
}

impl NewOrder {
    pub fn new(order_id: OrderId, user_id: UserId, pack_id: String, amount: Rupees, credits: i64) -> Self {
        Self {
            order_id,
            user_id,
            pack_id,
            plan_id: None,
            amount,
            credits,
            notes: Map::new(),
            status: OrderStatus::Created,
        }
    }

    pub fn with_plan_id(mut self, plan_id: Option<String>) -> Self {
        self.plan_id = plan_id;
        self
    }

    pub fn with_notes(mut self, notes: Map<String, Value>) -> Self {
        self.notes = notes;
        self
    }

    pub fn is_equivalent(&self, order: &Order) -> bool {
        self.order_id == order.order_id
            && self.user_id == order.user_id
            && self.pack_id == order.pack_id
            && self.plan_id == order.plan_id
            && self.amount == order.amount
            && self.credits == order.credits
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub pack_id: String,
    pub plan_id: Option<String>,
    pub amount: Rupees,
    pub credits: i64,
    #[serde(default)]
    pub notes: Map<String, Value>,
    pub status: OrderStatus,
    pub razorpay_order_id: Option<String>,
    pub razorpay_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------  ProviderOrderUpdate  ---------------------------------------------------------
/// The payment provider's response to an order creation request, attached to the local order row.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderOrderUpdate {
    pub razorpay_order_id: String,
    pub razorpay_data: Value,
}

impl ProviderOrderUpdate {
    pub fn new<S: Into<String>>(razorpay_order_id: S, razorpay_data: Value) -> Self {
        Self { razorpay_order_id: razorpay_order_id.into(), razorpay_data }
    }
}

//--------------------------------------         Plan          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingCycle {
    #[serde(rename = "forever")]
    Forever,
    #[serde(rename = "one-time")]
    OneTime,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Forever => "forever",
            BillingCycle::OneTime => "one-time",
        }
    }
}

impl FromStr for BillingCycle {
    type Err = ConversionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forever" => Ok(Self::Forever),
            "one-time" => Ok(Self::OneTime),
            s => Err(ConversionError(format!("Invalid billing cycle: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiLevel {
    Basic,
    Advanced,
}

impl AiLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiLevel::Basic => "basic",
            AiLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for AiLevel {
    type Err = ConversionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "advanced" => Ok(Self::Advanced),
            s => Err(ConversionError(format!("Invalid AI level: {s}"))),
        }
    }
}

/// A subscription plan or a one-off credit pack. Plans are read-only from the gateway's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    /// PostgREST returns `numeric` prices as `199`, `199.00` or `"199.00"`. All are accepted, down to the paisa.
    pub price: Rupees,
    pub billing_cycle: BillingCycle,
    #[serde(default)]
    pub description: String,
    pub credits: i64,
    pub ai_level: AiLevel,
    pub is_pack: bool,
    pub display_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

//--------------------------------------  PaymentVerification  ---------------------------------------------------------
/// A provider-confirmed payment that should be credited to a user. Only construct one of these after the provider
/// signature has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentVerification {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    pub user_id: UserId,
    pub credits: i64,
    pub pack_id: Option<String>,
}

//--------------------------------------     CreditOutcome     ---------------------------------------------------------
/// The answer of the verify-and-credit ledger operation. A `success = false` outcome is a business rejection (e.g. a
/// replayed payment id), not a transport error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditOutcome {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub previous_credits: Option<i64>,
    #[serde(default)]
    pub credits_added: Option<i64>,
    #[serde(default)]
    pub new_total: Option<i64>,
}

impl CreditOutcome {
    pub fn credited(previous_credits: i64, credits_added: i64, new_total: i64) -> Self {
        Self {
            success: true,
            error: None,
            code: None,
            previous_credits: Some(previous_credits),
            credits_added: Some(credits_added),
            new_total: Some(new_total),
        }
    }

    pub fn rejected<S: Into<String>>(error: S, code: &str) -> Self {
        Self { success: false, error: Some(error.into()), code: Some(code.to_string()), ..Default::default() }
    }
}

pub mod rejection_codes {
    pub const ORDER_NOT_FOUND: &str = "ORDER_NOT_FOUND";
    pub const USER_MISMATCH: &str = "USER_MISMATCH";
    pub const CREDITS_MISMATCH: &str = "CREDITS_MISMATCH";
    pub const ORDER_ALREADY_PAID: &str = "ORDER_ALREADY_PAID";
    pub const DUPLICATE_PAYMENT: &str = "DUPLICATE_PAYMENT";
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const INVALID_CREDITS: &str = "INVALID_CREDITS";
}

//--------------------------------------     WebhookEvent      ---------------------------------------------------------
/// A signature-verified payment provider webhook, reduced to its event type and the payment (or refund) entity.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub event_type: String,
    pub entity: Value,
}

impl WebhookEvent {
    pub fn new<S: Into<String>>(event_type: S, entity: Value) -> Self {
        Self { event_type: event_type.into(), entity }
    }

    /// The provider's id for the entity, e.g. `pay_xxx` or `rfnd_xxx`.
    pub fn entity_id(&self) -> Option<&str> {
        self.entity.get("id").and_then(Value::as_str)
    }
}

//--------------------------------------        Session        ---------------------------------------------------------
/// An authenticated caller, as vouched for by the auth provider.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub email: Option<String>,
    pub access_token: Secret<String>,
    pub refresh_token: Option<Secret<String>>,
    /// Seconds until the access token expires, if the auth provider said so.
    pub expires_in: Option<i64>,
}

impl Session {
    pub fn new<U: Into<UserId>>(user_id: U, access_token: String) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            access_token: Secret::new(access_token),
            refresh_token: None,
            expires_in: None,
        }
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }
}

//--------------------------------------     ProfileUpdate     ---------------------------------------------------------
/// Fields that callers may never write through a profile update. Credits change only through the payment ledger.
pub const PROTECTED_PROFILE_FIELDS: [&str; 3] = ["credits", "plan", "id"];

#[derive(Debug, Clone, Error)]
#[error("A profile update must be a JSON object")]
pub struct ProfileUpdateError;

/// A set of user-row fields to update. The protected fields are removed when the update is constructed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProfileUpdate(Map<String, Value>);

impl ProfileUpdate {
    pub fn new(mut fields: Map<String, Value>) -> Self {
        for key in PROTECTED_PROFILE_FIELDS {
            fields.remove(key);
        }
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Value> for ProfileUpdate {
    type Error = ProfileUpdateError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self::new(fields)),
            _ => Err(ProfileUpdateError),
        }
    }
}
