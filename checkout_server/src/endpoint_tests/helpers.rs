use actix_web::{
    body,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use checkout_engine::{
    db_types::{OrderId, Principal, Role, VariantId},
    events::EventProducers,
    payment_objects::CheckoutResult,
    traits::PaymentGateway,
    AdminApi,
    CheckoutFlowApi,
    OrdersApi,
    SettingsApi,
    SettlementApi,
    SqliteDatabase,
};
use log::debug;
use shop_common::{Pesewas, Secret};

use crate::{
    auth::{TokenIssuer, TokenValidator},
    config::AuthConfig,
    helpers::calculate_hmac,
    middleware::{HmacMiddlewareFactory, PAYSTACK_SIGNATURE_HEADER},
    routes::{
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
    server::json_config,
};

// DO NOT re-use these secrets anywhere.
pub const JWT_SECRET: &str = "endpoint-tests-jwt-secret";
pub const WEBHOOK_SECRET: &str = "sk_test_endpoint_tests";

pub fn auth_config() -> AuthConfig {
    AuthConfig::new(JWT_SECRET)
}

pub fn default_fee() -> Pesewas {
    Pesewas::from_cedis(30)
}

pub fn token_for(principal: &Principal) -> String {
    TokenIssuer::new(&auth_config()).issue_token(principal, None).expect("Failed to issue token")
}

pub fn user_token(id: &str) -> String {
    token_for(&Principal::new(id, Role::User))
}

pub fn admin_token(id: &str) -> String {
    token_for(&Principal::new(id, Role::Admin))
}

pub fn sign_webhook(body: &str) -> String {
    calculate_hmac(WEBHOOK_SECRET, body.as_bytes())
}

/// The same routes and middleware the server mounts, minus the access log and the webhook IP whitelist.
pub fn configure_routes<G>(db: SqliteDatabase, gateway: G) -> impl FnOnce(&mut ServiceConfig)
where G: PaymentGateway + Clone + 'static {
    move |cfg| {
        let producers = EventProducers::default();
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
        let api_scope = web::scope("/api")
            .service(admin_scope)
            .service(CheckoutRoute::<SqliteDatabase, G>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, G>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyOrderRoute::<SqliteDatabase>::new())
            .service(MyPaymentsRoute::<SqliteDatabase>::new());
        let paystack_scope = web::scope("/paystack")
            .wrap(HmacMiddlewareFactory::new(PAYSTACK_SIGNATURE_HEADER, Secret::new(WEBHOOK_SECRET.to_string())))
            .service(PaystackWebhookRoute::<SqliteDatabase, G>::new());
        cfg.app_data(json_config())
            .app_data(web::Data::new(CheckoutFlowApi::new(db.clone(), gateway.clone(), producers.clone())))
            .app_data(web::Data::new(SettlementApi::new(db.clone(), gateway, producers.clone())))
            .app_data(web::Data::new(AdminApi::new(db.clone(), producers)))
            .app_data(web::Data::new(OrdersApi::new(db.clone())))
            .app_data(web::Data::new(SettingsApi::new(db, default_fee())))
            .app_data(web::Data::new(TokenValidator::new(&auth_config())))
            .service(DeliveryFeeRoute::<SqliteDatabase>::new())
            .service(api_scope)
            .service(paystack_scope);
    }
}

/// Sends the request through a freshly built app. Middleware rejections come back as errors rather than responses, so
/// both are turned into a status and a body here.
pub async fn send<G>(db: &SqliteDatabase, gateway: &G, req: TestRequest) -> (StatusCode, String)
where G: PaymentGateway + Clone + 'static {
    let app = test::init_service(App::new().configure(configure_routes(db.clone(), gateway.clone()))).await;
    debug!("Making request");
    let res = match test::try_call_service(&app, req.to_request()).await {
        Ok(res) => res.map_into_boxed_body().into_parts().1,
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let bytes = body::to_bytes(res.into_body()).await.unwrap_or_default();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

pub fn get(path: &str, token: &str) -> TestRequest {
    with_token(TestRequest::get().uri(path), token)
}

pub fn post_json(path: &str, token: &str, body: serde_json::Value) -> TestRequest {
    with_token(TestRequest::post().uri(path).set_json(body), token)
}

fn with_token(req: TestRequest, token: &str) -> TestRequest {
    if token.is_empty() {
        req
    } else {
        req.insert_header(("Authorization", format!("Bearer {token}")))
    }
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response was not JSON ({e}): {body}"))
}

pub fn cart(variant_id: VariantId, quantity: i64) -> serde_json::Value {
    serde_json::json!({
        "items": [{ "variant_id": variant_id, "quantity": quantity }],
        "phone": "0241234567",
    })
}

/// Checks out one unit of `variant_id` for `customer` and returns the order id and payment reference.
pub async fn checked_out<G>(db: &SqliteDatabase, gateway: &G, customer: &str, variant_id: VariantId) -> (OrderId, String)
where G: PaymentGateway + Clone + 'static {
    let req = post_json("/api/checkout", &user_token(customer), cart(variant_id, 1));
    let (status, body) = send(db, gateway, req).await;
    assert_eq!(status, StatusCode::OK, "Checkout failed: {body}");
    let result: CheckoutResult = serde_json::from_str(&body).expect("Not a checkout result");
    (result.order_id, result.reference)
}
