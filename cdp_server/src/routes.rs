//! Request handler definitions
//!
//! Define each route and its handler here. Handlers are generic over the backend (and, for checkout, over the payment
//! provider), so that the same code serves Supabase, the local SQLite store and the mocks in the endpoint tests.
//!
//! Long-running work (database calls, provider calls) is always awaited, never blocked on. Each worker thread handles
//! its requests sequentially, so a blocking handler stalls every other request on that worker.
//!
//! Handlers that need to act as the caller narrow the shared backend with
//! [`for_session`](cdp_engine::traits::RequestScoped::for_session) before doing any work. Handlers for anonymous callers (plans, webhooks, the auth callback) use the APIs registered at start-up.
use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    get,
    http::header::LOCATION,
    web,
    HttpRequest,
    HttpResponse,
    Responder,
};
use bytes::Bytes;
use cdp_engine::{
    db_types::{PaymentVerification, ProfileUpdate, Session, WebhookEvent},
    traits::{AuthProvider, PaymentBackend, PaymentProvider, ProfileError},
    AuthApi,
    CatalogApi,
    CheckoutApi,
    CreateOrderRequest,
    CreditApi,
    CreditError,
    ProfileApi,
};
use log::*;
use razorpay_tools::{signatures::verify_payment_signature, RazorpayConfig, WebhookEnvelope};
use serde_json::Value;

use crate::{
    config::ServerOptions,
    data_objects::{
        AuthCallbackParams,
        CreateOrderParams,
        DataResponse,
        VerificationResponse,
        VerifyPaymentParams,
        WebhookAck,
    },
    errors::{ServerError, VerificationError, WebhookError},
    helpers::session_token,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Resolves the caller's session from the bearer header or session cookie. An auth provider that cannot be reached
/// is treated the same as an unknown token.
async fn current_session<A: AuthProvider>(
    req: &HttpRequest,
    auth: &AuthApi<A>,
    options: &ServerOptions,
) -> Option<Session> {
    let token = session_token(req, &options.session_cookie);
    auth.authenticate(token.as_deref()).await.unwrap_or_else(|e| {
        warn!("💻️ Could not resolve the caller's session. {e}");
        None
    })
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(create_order => Post "/create" impl PaymentBackend, PaymentProvider);
/// Opens a Razorpay order for a credit pack.
///
/// The caller must be signed in. The body is `{packId, amount, credits, planId?, receipt?, notes?}`, with `amount` in
/// whole rupees. The response carries the amount in paise, along with everything the checkout widget needs.
pub async fn create_order<B, P>(
    req: HttpRequest,
    body: Bytes,
    auth: web::Data<AuthApi<B>>,
    db: web::Data<B>,
    provider: web::Data<P>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    P: PaymentProvider,
{
    trace!("💻️ Received order creation request");
    let session = current_session(&req, &auth, &options)
        .await
        .ok_or_else(|| ServerError::Unauthorized("Unauthorized - Please sign in".into()))?;
    let params = serde_json::from_slice::<CreateOrderParams>(&body).map_err(|e| {
        debug!("💻️ Could not deserialize order request. {e}");
        ServerError::CouldNotDeserializePayload
    })?;
    let request = CreateOrderRequest::from(params);
    let api = CheckoutApi::new(db.for_session(&session), provider.into_inner());
    let result = api.create_order(&session, request).await?;
    debug!("💻️ Order {} ({}) created for {}", result.order_id, result.razorpay_order_id, result.user_id);
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Verify  ----------------------------------------------------
route!(verify_payment => Post "/verify" impl PaymentBackend);
/// Credits a completed checkout.
///
/// The checkout signature is checked before anything else. Only then is the caller's session compared to the user
/// being credited, and only then is the ledger called (exactly once).
pub async fn verify_payment<B>(
    req: HttpRequest,
    body: Bytes,
    auth: web::Data<AuthApi<B>>,
    db: web::Data<B>,
    razorpay: web::Data<RazorpayConfig>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, VerificationError>
where
    B: PaymentBackend,
{
    trace!("💻️ Received payment verification request");
    let params = serde_json::from_slice::<VerifyPaymentParams>(&body).map_err(|e| {
        debug!("💻️ Could not deserialize payment verification request. {e}");
        VerificationError::InvalidRequest
    })?;
    let payment = PaymentVerification::from(params);
    let valid = verify_payment_signature(
        razorpay.key_secret.reveal(),
        &payment.razorpay_order_id,
        &payment.razorpay_payment_id,
        &payment.razorpay_signature,
    );
    if !valid {
        warn!(
            "💻️ Invalid payment signature for order {} / payment {}",
            payment.razorpay_order_id, payment.razorpay_payment_id
        );
        return Err(VerificationError::InvalidSignature);
    }
    let session = current_session(&req, &auth, &options).await.ok_or_else(|| {
        info!("💻️ Payment {} was verified, but the caller is not signed in", payment.razorpay_payment_id);
        VerificationError::SessionMismatch
    })?;
    let api = CreditApi::new(db.for_session(&session));
    let outcome = api.verify_payment(&session, payment).await.map_err(|e| match e {
        CreditError::SessionMismatch { .. } => VerificationError::SessionMismatch,
        CreditError::LedgerError(e) => {
            error!("💻️ Error verifying payment. {e}");
            VerificationError::LedgerFailure
        },
    })?;
    if !outcome.success {
        return Err(VerificationError::Rejected {
            error: outcome.error.unwrap_or_else(|| "Payment verification failed".into()),
            code: outcome.code.unwrap_or_else(|| "UNKNOWN".into()),
        });
    }
    Ok(HttpResponse::Ok().json(VerificationResponse::from(outcome)))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(razorpay_webhook => Post "" impl PaymentBackend);
/// Forwards a signature-checked Razorpay webhook to the ledger.
///
/// The signature is checked by [`crate::middleware::WebhookHmacMiddlewareFactory`] before this handler runs.
pub async fn razorpay_webhook<B>(body: Bytes, api: web::Data<CreditApi<B>>) -> Result<HttpResponse, WebhookError>
where B: PaymentBackend {
    let envelope = serde_json::from_slice::<WebhookEnvelope>(&body).map_err(|e| {
        warn!("💻️ Could not parse webhook body. {e}");
        WebhookError::InvalidJson
    })?;
    let event_type = envelope.event.clone().unwrap_or_default();
    trace!("💻️ Received {event_type} webhook");
    let entity = envelope.entity().cloned().ok_or_else(|| {
        info!("💻️ The {event_type} webhook has neither a payment nor a refund entity");
        WebhookError::InvalidPayload
    })?;
    let result = api.process_webhook(WebhookEvent::new(event_type.as_str(), entity)).await.map_err(|e| {
        error!("💻️ Error processing {event_type} webhook. {e}");
        WebhookError::ProcessingError
    })?;
    info!("💻️ Webhook {event_type} processed");
    Ok(HttpResponse::Ok().json(WebhookAck::processed(result)))
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(auth_callback => Get "/auth/callback" impl PaymentBackend);
/// Completes an OAuth sign-in.
///
/// The one-time `code` is exchanged for a session, which is stored in the session cookie. The browser always ends up
/// on a redirect: `/dashboard` on success, `/auth?error=...` otherwise.
pub async fn auth_callback<B>(
    req: HttpRequest,
    query: web::Query<AuthCallbackParams>,
    auth: web::Data<AuthApi<B>>,
    options: web::Data<ServerOptions>,
) -> HttpResponse
where
    B: PaymentBackend,
{
    let Some(code) = query.into_inner().code.filter(|c| !c.trim().is_empty()) else {
        warn!("💻️ No code found in OAuth callback");
        return redirect_to_auth_error("No authentication code provided");
    };
    let verifier_cookie = options.code_verifier_cookie();
    let code_verifier = req.cookie(&verifier_cookie).map(|c| c.value().to_string());
    match auth.exchange_code(&code, code_verifier).await {
        Ok(session) => {
            debug!("💻️ Authentication successful, redirecting {} to the dashboard", session.user_id);
            let mut cookie = Cookie::build(options.session_cookie.clone(), session.access_token.reveal().clone())
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(options.secure_cookies)
                .finish();
            if let Some(expires_in) = session.expires_in {
                cookie.set_max_age(CookieDuration::seconds(expires_in));
            }
            let mut used_verifier = Cookie::new(verifier_cookie, "");
            used_verifier.set_path("/");
            used_verifier.make_removal();
            HttpResponse::SeeOther().insert_header((LOCATION, "/dashboard")).cookie(cookie).cookie(used_verifier).finish()
        },
        Err(e) => {
            warn!("💻️ Auth callback error. {e}");
            redirect_to_auth_error(&e.to_string())
        },
    }
}

fn redirect_to_auth_error(message: &str) -> HttpResponse {
    let location = format!("/auth?error={}", urlencoding::encode(message));
    HttpResponse::SeeOther().insert_header((LOCATION, location)).finish()
}

//----------------------------------------------   Plans  ----------------------------------------------------
route!(plans => Get "/plans" impl PaymentBackend);
pub async fn plans<B: PaymentBackend>(api: web::Data<CatalogApi<B>>) -> HttpResponse {
    trace!("💻️ GET plans");
    HttpResponse::Ok().json(api.plans().await)
}

route!(credit_packs => Get "/plans/packs" impl PaymentBackend);
pub async fn credit_packs<B: PaymentBackend>(api: web::Data<CatalogApi<B>>) -> HttpResponse {
    trace!("💻️ GET credit packs");
    HttpResponse::Ok().json(api.credit_packs().await)
}

route!(free_plan => Get "/plans/free" impl PaymentBackend);
/// Responds with `null` if there is no free plan.
pub async fn free_plan<B: PaymentBackend>(api: web::Data<CatalogApi<B>>) -> HttpResponse {
    trace!("💻️ GET free plan");
    HttpResponse::Ok().json(api.free_plan().await)
}

//----------------------------------------------   Profile  ----------------------------------------------------
route!(update_profile => Post "/user/update" impl PaymentBackend);
/// Updates the caller's own profile. `credits`, `plan` and `id` are silently dropped from the update.
pub async fn update_profile<B>(
    req: HttpRequest,
    body: Bytes,
    auth: web::Data<AuthApi<B>>,
    db: web::Data<B>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
{
    let session = current_session(&req, &auth, &options)
        .await
        .ok_or_else(|| ServerError::Unauthorized("Unauthorized".into()))?;
    let update = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| ProfileUpdate::try_from(v).ok())
        .ok_or(ServerError::CouldNotDeserializePayload)?;
    let api = ProfileApi::new(db.for_session(&session));
    let rows = api.update_profile(&session, update).await.map_err(|e| {
        warn!("💻️ Could not update the profile of {}. {e}", session.user_id);
        match e {
            ProfileError::DatabaseError(_) => ServerError::ProfileUpdateFailed("Could not update profile".into()),
            e => ServerError::ProfileUpdateFailed(e.to_string()),
        }
    })?;
    Ok(HttpResponse::Ok().json(DataResponse { data: rows }))
}
