//! Webhook signature middleware for Actix Web.
//!
//! Razorpay signs the raw body of every webhook call with the webhook secret (HMAC-SHA256, hex encoded) and sends the
//! signature in the `X-Razorpay-Signature` header.
//!
//! Wrap the webhook scope with [`WebhookHmacMiddlewareFactory`]. Calls without a signature, or with a signature that
//! does not match the body, are answered with a 400 and never reach the handler. Calls that pass have their body
//! restored, so the handler can read it again.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use cdp_common::Secret;
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use razorpay_tools::{signatures::verify_webhook_signature, WEBHOOK_SIGNATURE_HEADER};

use crate::errors::WebhookError;

pub struct WebhookHmacMiddlewareFactory {
    key: Secret<String>,
}

impl WebhookHmacMiddlewareFactory {
    pub fn new(key: Secret<String>) -> Self {
        WebhookHmacMiddlewareFactory { key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for WebhookHmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = WebhookHmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookHmacMiddlewareService { key: self.key.clone(), service: Rc::new(service) }))
    }
}

pub struct WebhookHmacMiddlewareService<S> {
    key: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for WebhookHmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.key.clone();
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature");
            let signature = match req.headers().get(WEBHOOK_SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
                Some(s) => s.to_string(),
                None => {
                    warn!("🔐️ No Razorpay signature found in webhook request. Denying access.");
                    return Ok(req.error_response(WebhookError::MissingSignature).map_into_right_body());
                },
            };
            let data = match req.extract::<web::Bytes>().await {
                Ok(data) => data,
                Err(e) => {
                    warn!("🔐️ Failed to extract webhook body: {e}");
                    return Ok(req.error_response(WebhookError::InvalidSignature).map_into_right_body());
                },
            };
            if verify_webhook_signature(secret.reveal(), data.as_ref(), &signature) {
                trace!("🔐️ Webhook signature check ✅️");
                req.set_payload(bytes_to_payload(data));
                let res = service.call(req).await?;
                Ok(res.map_into_left_body())
            } else {
                warn!("🔐️ Invalid webhook signature. Denying access.");
                Ok(req.error_response(WebhookError::InvalidSignature).map_into_right_body())
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
