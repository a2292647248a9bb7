//! # Razorpay tools
//!
//! A thin client for the parts of the Razorpay REST API used by the Coder Duo payment gateway, together with the
//! HMAC helpers needed to authenticate Razorpay's checkout callbacks and webhooks.
//!
//! * [`RazorpayApi`] creates and fetches orders.
//! * [`signatures`] computes and verifies checkout and webhook signatures.
//! * [`WebhookEnvelope`] models the envelope of an incoming webhook call.
mod api;
mod config;
mod data_objects;
mod error;

pub mod signatures;

pub use api::RazorpayApi;
pub use config::{RazorpayConfig, DEFAULT_RAZORPAY_API_URL};
pub use data_objects::{NewRazorpayOrder, RazorpayOrder, WebhookEntity, WebhookEnvelope, WebhookPayload};
pub use error::RazorpayApiError;

/// The header Razorpay uses to carry the webhook body signature.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-razorpay-signature";
