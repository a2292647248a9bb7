use std::{net::IpAddr, time::Duration};

use actix_web::{
    dev::{Server, Service, ServiceResponse},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use cdp_engine::{traits::PaymentBackend, AuthApi, CatalogApi, CreditApi, SqliteDatabase};
#[cfg(feature = "supabase")]
use cdp_engine::{Anonymous, ServiceRole, SupabaseDatabase};
use futures::{
    future::{ok, Either},
    FutureExt,
};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    helpers::get_remote_ip,
    integrations::razorpay::RazorpayProvider,
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

/// Picks the backend once, then runs the server until it is shut down.
///
/// * A Supabase URL with a service role key gives a privileged Supabase backend.
/// * A Supabase URL without a service role key gives a Supabase backend that acts with the caller's own token.
/// * No Supabase URL gives the local SQLite store at `CDP_DATABASE_URL`, migrated on start-up.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let provider =
        RazorpayProvider::new(config.razorpay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    #[cfg(feature = "supabase")]
    if let Some(supabase) = config.supabase.clone() {
        return match supabase.service_role_key.clone() {
            Some(key) => {
                info!("🚀️ Using the Supabase backend at {} with the service role", supabase.url);
                let db = SupabaseDatabase::new(&supabase, ServiceRole::new(key))
                    .map_err(|e| ServerError::InitializeError(e.to_string()))?;
                serve(config, db, provider).await
            },
            None => {
                warn!(
                    "🚨️ SUPABASE_SERVICE_ROLE_KEY is not set. Orders and credits will be written with the caller's own \
                     privileges. Do not run production like this. 🚨️"
                );
                let db = SupabaseDatabase::new(&supabase, Anonymous)
                    .map_err(|e| ServerError::InitializeError(e.to_string()))?;
                serve(config, db, provider).await
            },
        };
    }
    info!("🚀️ Using the local SQLite backend at {}", config.database_url);
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    serve(config, db, provider).await
}

async fn serve<B>(config: ServerConfig, db: B, provider: RazorpayProvider) -> Result<(), ServerError>
where B: PaymentBackend + Send + 'static {
    let srv = create_server_instance(config, db, provider)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance<B>(config: ServerConfig, db: B, provider: RazorpayProvider) -> Result<Server, ServerError>
where B: PaymentBackend + Send + 'static {
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let auth_api = AuthApi::new(db.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let credit_api = CreditApi::new(db.clone());
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cdp::access_log"))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(provider.clone()))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(credit_api))
            .app_data(web::Data::new(config.razorpay.clone()))
            .app_data(web::Data::new(options));
        let use_x_forwarded_for = config.use_x_forwarded_for;
        let use_forwarded = config.use_forwarded;
        let whitelist = config.razorpay_whitelist.clone();
        // Registered before the checkout scope, which would otherwise swallow it
        let webhook_scope = web::scope("/api/payment/razorpay/webhook")
            .service(RazorpayWebhookRoute::<B>::new())
            .wrap(WebhookHmacMiddlewareFactory::new(config.razorpay.webhook_secret.clone()))
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                if is_whitelisted(peer_ip, whitelist.as_deref()) {
                    Either::Left(srv.call(req).map(|res| res.map(ServiceResponse::map_into_left_body)))
                } else {
                    Either::Right(ok(req.error_response(ServerError::ForbiddenPeer).map_into_right_body()))
                }
            });
        let checkout_scope = web::scope("/api/payment/razorpay")
            .service(CreateOrderRoute::<B, RazorpayProvider>::new())
            .service(VerifyPaymentRoute::<B>::new());
        let api_scope = web::scope("/api")
            .service(PlansRoute::<B>::new())
            .service(CreditPacksRoute::<B>::new())
            .service(FreePlanRoute::<B>::new())
            .service(UpdateProfileRoute::<B>::new());
        app.service(health)
            .service(AuthCallbackRoute::<B>::new())
            .service(webhook_scope)
            .service(checkout_scope)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// With no whitelist configured, every peer is allowed. With one, the peer's address must be known and listed.
pub fn is_whitelisted(peer_ip: Option<IpAddr>, whitelist: Option<&[IpAddr]>) -> bool {
    match (peer_ip, whitelist) {
        (_, None) => true,
        (Some(ip), Some(whitelist)) => {
            let allowed = whitelist.contains(&ip);
            if allowed {
                info!("🔐️ Razorpay webhook from {ip}");
            } else {
                warn!("🔐️ Webhook call from {ip}, which is not whitelisted. Denying access.");
            }
            allowed
        },
        (None, Some(_)) => {
            warn!("🔐️ No IP address found in webhook request. Denying access.");
            false
        },
    }
}
