use actix_web::{
    body::MessageBody,
    dev::ServiceResponse,
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web,
    App,
};
use cdp_engine::{db_types::Session, AuthApi, CatalogApi, CreditApi};
use razorpay_tools::{signatures, RazorpayConfig};

use super::mocks::{MockBackend, MockProvider};
use crate::{
    config::ServerOptions,
    middleware::WebhookHmacMiddlewareFactory,
    routes::{
        health,
        AuthCallbackRoute,
        CreateOrderRoute,
        CreditPacksRoute,
        FreePlanRoute,
        PlansRoute,
        RazorpayWebhookRoute,
        UpdateProfileRoute,
        VerifyPaymentRoute,
    },
};

// Test-only credentials. DO NOT re-use these anywhere.
pub const KEY_ID: &str = "rzp_test_1DP5mmOlF5G5ag";
pub const KEY_SECRET: &str = "thisisatestkeysecret";
pub const WEBHOOK_SECRET: &str = "thisisatestwebhooksecret";

pub const ALICE: &str = "5f0c3b8e-7a0e-4c0a-9d7e-1b2c3d4e5f60";
pub const BOB: &str = "9a1d7c44-2f3b-4e5a-8c6d-7e8f9a0b1c2d";
pub const ALICE_TOKEN: &str = "alice-access-token";
pub const BOB_TOKEN: &str = "bob-access-token";

pub type Setup = fn(&mut MockBackend);

/// Builds a mock backend whose clones and session-scoped copies are all configured by `setup`, so expectations hold
/// no matter which copy a handler ends up using.
pub fn backend(setup: Setup) -> MockBackend {
    let mut db = MockBackend::new();
    setup(&mut db);
    db.expect_clone().returning(move || backend(setup));
    db.expect_for_session().returning(move |_| backend(setup));
    db
}

/// Alice and Bob each have a valid access token. Every other token is unknown.
pub fn known_sessions(db: &mut MockBackend) {
    db.expect_session_for_token().returning(|token| {
        let session = match token {
            ALICE_TOKEN => Some(Session::new(ALICE, ALICE_TOKEN.to_string())),
            BOB_TOKEN => Some(Session::new(BOB, BOB_TOKEN.to_string())),
            _ => None,
        };
        Ok(session)
    });
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

pub fn checkout_signature(order_id: &str, payment_id: &str) -> String {
    signatures::payment_signature(KEY_SECRET, order_id, payment_id)
}

pub fn webhook_signature(body: &str) -> String {
    signatures::webhook_signature(WEBHOOK_SECRET, body.as_bytes())
}

pub fn no_provider_calls() -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_create_order().never();
    provider.expect_key_id().returning(|| KEY_ID.to_string());
    provider
}

/// Registers every route against mock backends configured by `setup`, the same way the server does.
pub async fn call(req: TestRequest, setup: Setup, provider: MockProvider) -> (StatusCode, HeaderMap, String) {
    let razorpay = RazorpayConfig::new(KEY_ID, KEY_SECRET, WEBHOOK_SECRET);
    let webhook_scope = web::scope("/api/payment/razorpay/webhook")
        .service(RazorpayWebhookRoute::<MockBackend>::new())
        .wrap(WebhookHmacMiddlewareFactory::new(razorpay.webhook_secret.clone()));
    let checkout_scope = web::scope("/api/payment/razorpay")
        .service(CreateOrderRoute::<MockBackend, MockProvider>::new())
        .service(VerifyPaymentRoute::<MockBackend>::new());
    let api_scope = web::scope("/api")
        .service(PlansRoute::<MockBackend>::new())
        .service(CreditPacksRoute::<MockBackend>::new())
        .service(FreePlanRoute::<MockBackend>::new())
        .service(UpdateProfileRoute::<MockBackend>::new());
    let app = App::new()
        .app_data(web::Data::new(AuthApi::new(backend(setup))))
        .app_data(web::Data::new(CatalogApi::new(backend(setup))))
        .app_data(web::Data::new(CreditApi::new(backend(setup))))
        .app_data(web::Data::new(backend(setup)))
        .app_data(web::Data::new(provider))
        .app_data(web::Data::new(razorpay))
        .app_data(web::Data::new(ServerOptions::default()))
        .service(health)
        .service(AuthCallbackRoute::<MockBackend>::new())
        .service(webhook_scope)
        .service(checkout_scope)
        .service(api_scope);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    into_parts(res).await
}

async fn into_parts<B: MessageBody>(res: ServiceResponse<B>) -> (StatusCode, HeaderMap, String) {
    let status = res.status();
    let headers = res.headers().clone();
    let body = test::read_body(res).await;
    (status, headers, String::from_utf8_lossy(&body).into_owned())
}
