use std::{future::ready, time::Duration};

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use checkout_engine::{
    events::EventProducers,
    traits::PaymentGateway,
    AdminApi,
    CheckoutFlowApi,
    OrdersApi,
    SettingsApi,
    SettlementApi,
    SqliteDatabase,
};
use futures::future::Either;
use log::*;

use crate::{
    auth::TokenValidator,
    config::{ServerConfig, ServerOptions},
    errors::{AuthError, ServerError},
    expiry_worker::start_expiry_worker,
    helpers::{get_remote_ip, is_whitelisted},
    integrations::{notifications::create_notification_event_handlers, paystack::PaystackGateway},
    middleware::{HmacMiddlewareFactory, PAYSTACK_SIGNATURE_HEADER},
    routes::{
        health,
        AddTrackingNoteRoute,
        CancelOrderRoute,
        CheckoutRoute,
        DeliveryFeeRoute,
        KpisRoute,
        MyOrderRoute,
        MyOrdersRoute,
        MyPaymentsRoute,
        OrderByIdRoute,
        OrdersRoute,
        PaymentByReferenceRoute,
        PaymentsRoute,
        PaystackWebhookRoute,
        SetDeliveryFeeRoute,
        SetOrderStatusRoute,
        VerifyPaymentRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let gateway =
        PaystackGateway::new(config.paystack.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_notification_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers();
    // The worker runs for the lifetime of the process
    let _worker = start_expiry_worker(db.clone(), gateway.clone(), producers.clone(), config.unpaid_order_timeout);
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Malformed JSON bodies are reported in the same `{"error": ...}` shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}

pub fn create_server_instance<G>(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: G,
    producers: EventProducers,
) -> Result<Server, ServerError>
where
    G: PaymentGateway + Clone + Send + 'static,
{
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutFlowApi::new(db.clone(), gateway.clone(), producers.clone());
        let settlement_api = SettlementApi::new(db.clone(), gateway.clone(), producers.clone());
        let admin_api = AdminApi::new(db.clone(), producers.clone());
        let orders_api = OrdersApi::new(db.clone());
        let settings_api = SettingsApi::new(db.clone(), config.default_delivery_fee);
        let validator = TokenValidator::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("checkout::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(admin_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(settings_api))
            .app_data(web::Data::new(validator));
        let admin_scope = web::scope("/admin")
            .service(KpisRoute::<SqliteDatabase>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(SetOrderStatusRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(AddTrackingNoteRoute::<SqliteDatabase>::new())
            .service(PaymentsRoute::<SqliteDatabase>::new())
            .service(PaymentByReferenceRoute::<SqliteDatabase>::new())
            .service(SetDeliveryFeeRoute::<SqliteDatabase>::new());
        // Routes that require authentication
        let api_scope = web::scope("/api")
            .service(admin_scope)
            .service(CheckoutRoute::<SqliteDatabase, G>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, G>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyOrderRoute::<SqliteDatabase>::new())
            .service(MyPaymentsRoute::<SqliteDatabase>::new());
        let options = ServerOptions::from_config(&config);
        let paystack_whitelist = config.webhook.ip_whitelist.clone();
        let paystack_scope = web::scope("/paystack")
            .wrap(HmacMiddlewareFactory::new(PAYSTACK_SIGNATURE_HEADER, config.webhook.secret.clone()))
            .wrap_fn(move |req, srv| {
                // Collect peer IP from x-forwarded-for, or forwarded headers _if_ `use_nnn` has been set to true
                // in the configuration. Otherwise, use the peer address from the connection info.
                let peer_ip = get_remote_ip(req.request(), options.use_x_forwarded_for, options.use_forwarded);
                if is_whitelisted(peer_ip, paystack_whitelist.as_deref()) {
                    Either::Left(srv.call(req))
                } else {
                    warn!("🔐️ Paystack webhook call from {peer_ip:?} is not on the whitelist. Denying access.");
                    Either::Right(ready(Err(ServerError::AuthenticationError(AuthError::ForbiddenPeer).into())))
                }
            })
            .service(PaystackWebhookRoute::<SqliteDatabase, G>::new());
        app.service(health).service(DeliveryFeeRoute::<SqliteDatabase>::new()).service(api_scope).service(paystack_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
