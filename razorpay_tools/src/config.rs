use cdp_common::{helpers::env_value, Secret};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";

#[derive(Debug, Clone, Default)]
pub struct RazorpayConfig {
    /// The public key id. It is handed to the checkout widget, so it is not a secret.
    pub key_id: String,
    /// Signs checkout callbacks (`order_id|payment_id`) and authenticates REST calls.
    pub key_secret: Secret<String>,
    /// Signs webhook bodies. Razorpay keeps this separate from the API key secret.
    pub webhook_secret: Secret<String>,
    pub api_url: String,
}

impl RazorpayConfig {
    pub fn new(key_id: &str, key_secret: &str, webhook_secret: &str) -> Self {
        Self {
            key_id: key_id.to_string(),
            key_secret: Secret::new(key_secret.to_string()),
            webhook_secret: Secret::new(webhook_secret.to_string()),
            api_url: DEFAULT_RAZORPAY_API_URL.to_string(),
        }
    }

    /// Reads the Razorpay credentials from the environment.
    ///
    /// Missing secrets do not stop the server. Instead, a random secret is generated for the session, which means that
    /// every signature check fails closed until the real secret is configured.
    pub fn new_from_env_or_default() -> Self {
        let key_id = env_value("RAZORPAY_KEY_ID").unwrap_or_else(|| {
            error!("🪛️ RAZORPAY_KEY_ID is not set. The checkout widget will not be able to open.");
            String::default()
        });
        let key_secret = Secret::from_env("RAZORPAY_KEY_SECRET").unwrap_or_else(|| {
            error!(
                "🪛️ RAZORPAY_KEY_SECRET is not set. Order creation will fail and payment verification will reject \
                 every signature."
            );
            random_secret()
        });
        let webhook_secret = Secret::from_env("RAZORPAY_WEBHOOK_SECRET").unwrap_or_else(|| {
            error!("🪛️ RAZORPAY_WEBHOOK_SECRET is not set. All incoming webhooks will be rejected.");
            random_secret()
        });
        let api_url = env_value("RAZORPAY_API_URL").unwrap_or_else(|| {
            debug!("🪛️ RAZORPAY_API_URL is not set. Using {DEFAULT_RAZORPAY_API_URL}");
            DEFAULT_RAZORPAY_API_URL.to_string()
        });
        Self {
            key_id,
            key_secret,
            webhook_secret,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

fn random_secret() -> Secret<String> {
    Secret::new(thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect())
}
