mod hmac;

pub use hmac::{WebhookHmacMiddlewareFactory, WebhookHmacMiddlewareService};
