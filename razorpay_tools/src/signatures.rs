//! HMAC-SHA256 signatures used by Razorpay.
//!
//! Two different messages are signed, with two different keys:
//! * Checkout callbacks sign `"{order_id}|{payment_id}"` with the API key secret.
//! * Webhooks sign the raw request body with the webhook secret.
//!
//! Signatures travel as lowercase hex. Verification decodes the supplied hex and compares it to the MAC in constant
//! time. Anything else, including uppercase hex or surrounding whitespace, is simply a mismatch.
use hmac::{Hmac, Mac};
use log::trace;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, data: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(data);
    Some(mac)
}

fn checkout_message(order_id: &str, payment_id: &str) -> String {
    format!("{order_id}|{payment_id}")
}

/// Calculates the hex-encoded HMAC-SHA256 of `data`.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    mac_for(secret, data).map(|mac| hex::encode(mac.finalize().into_bytes())).unwrap_or_default()
}

/// Checks a hex-encoded HMAC-SHA256 of `data`.
pub fn verify_hmac(secret: &str, data: &[u8], signature: &str) -> bool {
    if !signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        trace!("🔐️ Signature is not lowercase hex");
        return false;
    }
    let Ok(expected) = hex::decode(signature) else {
        trace!("🔐️ Signature is not valid hex");
        return false;
    };
    mac_for(secret, data).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}

/// The signature Razorpay's checkout hands to the client after a successful payment.
pub fn payment_signature(key_secret: &str, order_id: &str, payment_id: &str) -> String {
    calculate_hmac(key_secret, checkout_message(order_id, payment_id).as_bytes())
}

pub fn verify_payment_signature(key_secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    verify_hmac(key_secret, checkout_message(order_id, payment_id).as_bytes(), signature)
}

/// The signature Razorpay sends in the `X-Razorpay-Signature` header of a webhook call.
pub fn webhook_signature(webhook_secret: &str, body: &[u8]) -> String {
    calculate_hmac(webhook_secret, body)
}

pub fn verify_webhook_signature(webhook_secret: &str, body: &[u8], signature: &str) -> bool {
    verify_hmac(webhook_secret, body, signature)
}
